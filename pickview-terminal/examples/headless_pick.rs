/// Example: Load a mesh, click the middle of the view and report what happened
///
/// Usage: cargo run --example headless_pick -- path/to/mesh.obj
use std::env;
use std::error::Error;

use pickview_core::{load_mesh, MeshGeometry, PickOutcome, PointerEvent, Viewer, ViewerConfig};
use pickview_terminal::TerminalRenderer;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = ViewerConfig::default();
    let geometry = match env::args().nth(1) {
        Some(path) => {
            config.asset.path = path;
            load_mesh(&config.asset.path)
        }
        None => {
            println!("No mesh provided, using a cube at the orbit target...");
            Ok(centered_cube(&config))
        }
    };

    let mut viewer = Viewer::bootstrap(&config);
    viewer.on_asset_loaded(geometry);

    let (columns, rows) = (80u16, 24u16);
    let mut renderer = TerminalRenderer::new(columns, rows);
    viewer.frame(&mut renderer)?;

    let event = PointerEvent {
        client_x: columns as f32 / 2.0 + 0.5,
        client_y: rows as f32 / 2.0 + 0.5,
    };
    match viewer.on_pointer_down(&event, columns as f32, rows as f32)? {
        PickOutcome::Recolored { object, face } => {
            println!("Recolored face {} of {:?}", face.index, object)
        }
        PickOutcome::Missed => println!("Nothing under the pointer"),
        PickOutcome::Skipped(reason) => println!("Pick skipped: {}", reason),
    }

    viewer.frame(&mut renderer)?;
    let mut out = std::io::stdout();
    renderer.draw(&mut out)?;
    println!();

    Ok(())
}

fn centered_cube(config: &ViewerConfig) -> MeshGeometry {
    let target = config.camera.target();
    let mut cube = MeshGeometry::new();
    for triangle in MeshGeometry::cube(2.0).triangles() {
        let [a, b, c] = triangle.vertices.map(|v| v + target.coords);
        cube.push_triangle(pickview_core::Triangle::new(a, b, c));
    }
    cube
}
