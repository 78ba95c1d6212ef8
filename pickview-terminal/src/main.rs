/// PickView Terminal - click a triangle to paint it
///
/// Controls:
///   - Left click: Recolor the triangle under the cursor
///   - Left drag / WASD / Arrow Keys: Orbit
///   - Right drag: Pan
///   - Wheel / +/-: Zoom
///   - Q/ESC: Quit
use clap::Parser;
use std::error::Error;
use std::fs::File;
use std::path::PathBuf;

use pickview_core::ViewerConfig;
use pickview_terminal::TerminalApp;

#[derive(Parser, Debug)]
#[command(name = "pickview", version, about = "Terminal mesh viewer with triangle picking")]
struct Args {
    /// Mesh to load (.obj or .stl); overrides the config's asset path
    asset: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs to this file; the terminal is busy drawing
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<(), Box<dyn Error>> {
    let mut builder = match log_file {
        Some(path) => {
            let mut builder =
                env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
            builder.target(env_logger::Target::Pipe(Box::new(File::create(path)?)));
            builder
        }
        None => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error"))
        }
    };
    builder.init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(asset) = &args.asset {
        config.asset.path = asset.to_string_lossy().into_owned();
    }
    log::info!("starting viewer with asset '{}'", config.asset.path);

    let mut app = TerminalApp::new(&config)?;
    app.run()?;

    Ok(())
}
