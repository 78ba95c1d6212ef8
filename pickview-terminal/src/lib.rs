/// Terminal frontend: truecolor mesh viewer with mouse picking
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal,
};
use std::io::{stdout, Write};
use std::time::{Duration, Instant};

use pickview_core::{
    FrameStatus, PickOutcome, PointerEvent, RenderSurface, Viewer, ViewerConfig, ViewerResult,
};

pub mod asset;
pub mod renderer;

pub use asset::AssetLoad;
pub use renderer::{TerminalRenderer, CELL_ASPECT};

/// Radians per arrow-key press
const KEY_ROTATE_STEP: f32 = 0.1;

/// Main application struct for the terminal viewer
pub struct TerminalApp {
    viewer: Viewer,
    renderer: TerminalRenderer,
    asset: AssetLoad,
    asset_status: String,
    drag: Option<(MouseButton, u16, u16)>,
    last_pick: Option<PickOutcome>,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    /// Bootstrap the viewer at the current terminal size and start loading the asset.
    pub fn new(config: &ViewerConfig) -> ViewerResult<Self> {
        let (columns, rows) = terminal::size()?;
        let asset = AssetLoad::spawn(config.asset.path.clone());
        Ok(Self::with_size(config, columns, rows, asset))
    }

    pub fn with_size(config: &ViewerConfig, columns: u16, rows: u16, asset: AssetLoad) -> Self {
        let viewer = Viewer::bootstrap(config);
        let asset_status = format!("loading {}", viewer.asset_path());

        Self {
            viewer,
            renderer: TerminalRenderer::new(columns, rows),
            asset,
            asset_status,
            drag: None,
            last_pick: None,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        }
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn renderer(&self) -> &TerminalRenderer {
        &self.renderer
    }

    pub fn last_pick(&self) -> Option<&PickOutcome> {
        self.last_pick.as_ref()
    }

    pub fn run(&mut self) -> ViewerResult<()> {
        terminal::enable_raw_mode()?;
        execute!(
            stdout(),
            terminal::EnterAlternateScreen,
            cursor::Hide,
            EnableMouseCapture
        )?;

        let result = self.main_loop();

        // Cleanup
        execute!(
            stdout(),
            DisableMouseCapture,
            terminal::LeaveAlternateScreen,
            cursor::Show
        )?;
        terminal::disable_raw_mode()?;

        result
    }

    fn main_loop(&mut self) -> ViewerResult<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        loop {
            let frame_start = Instant::now();

            while event::poll(Duration::ZERO)? {
                let event = event::read()?;
                self.handle_event(event)?;
            }

            if self.step()? == FrameStatus::Stopped {
                break;
            }
            self.present()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    /// Collect a finished asset load, then render one frame into the cell buffer.
    pub fn step(&mut self) -> ViewerResult<FrameStatus> {
        if let Some(result) = self.asset.poll() {
            let failure = result.as_ref().err().map(|e| e.to_string());
            match self.viewer.on_asset_loaded(result) {
                Some(_) => self.asset_status = self.viewer.asset_path().to_string(),
                None => {
                    self.asset_status =
                        format!("failed: {}", failure.unwrap_or_else(|| "no mesh".to_string()))
                }
            }
        }

        self.viewer.frame(&mut self.renderer)
    }

    pub fn handle_event(&mut self, event: Event) -> ViewerResult<()> {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse)?,
            Event::Resize(columns, rows) => self.renderer.set_display_size(columns, rows),
            _ => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, KeyEvent { code, kind, .. }: KeyEvent) {
        if kind == KeyEventKind::Release {
            return;
        }

        let controls = &mut self.viewer.controls;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.viewer.frames.token().cancel();
            }
            KeyCode::Char('w') | KeyCode::Up => controls.rotate_up(KEY_ROTATE_STEP),
            KeyCode::Char('s') | KeyCode::Down => controls.rotate_up(-KEY_ROTATE_STEP),
            KeyCode::Char('a') | KeyCode::Left => controls.rotate_left(KEY_ROTATE_STEP),
            KeyCode::Char('d') | KeyCode::Right => controls.rotate_left(-KEY_ROTATE_STEP),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let scale = controls.zoom_scale();
                controls.dolly_in(scale);
            }
            KeyCode::Char('-') => {
                let scale = controls.zoom_scale();
                controls.dolly_out(scale);
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) -> ViewerResult<()> {
        let (columns, rows) = (mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::Down(button) => {
                if button == MouseButton::Left {
                    self.pick(columns, rows)?;
                }
                self.drag = Some((button, columns, rows));
            }
            MouseEventKind::Drag(button) => {
                let Some((_, last_x, last_y)) = self.drag else {
                    self.drag = Some((button, columns, rows));
                    return Ok(());
                };
                let dx = columns as f32 - last_x as f32;
                // Rows are twice as tall as columns are wide
                let dy = (rows as f32 - last_y as f32) * CELL_ASPECT;
                let height = self.renderer_rows() * CELL_ASPECT;

                match button {
                    MouseButton::Left => self.viewer.controls.rotate_by_drag(dx, dy, height),
                    MouseButton::Right | MouseButton::Middle => {
                        self.viewer
                            .controls
                            .pan_by_drag(&self.viewer.camera, dx, dy, height)
                    }
                }
                self.drag = Some((button, columns, rows));
            }
            MouseEventKind::Up(_) => self.drag = None,
            MouseEventKind::ScrollUp => self.viewer.controls.wheel(-1.0),
            MouseEventKind::ScrollDown => self.viewer.controls.wheel(1.0),
            _ => {}
        }

        Ok(())
    }

    fn renderer_rows(&self) -> f32 {
        self.renderer.display_size().1 as f32
    }

    /// Pick through the center of the clicked cell.
    fn pick(&mut self, column: u16, row: u16) -> ViewerResult<()> {
        let (width, height) = self.renderer.display_size();
        let event = PointerEvent {
            client_x: column as f32 + 0.5,
            client_y: row as f32 + 0.5,
        };

        let outcome = self
            .viewer
            .on_pointer_down(&event, width as f32, height as f32)?;
        self.last_pick = Some(outcome);
        Ok(())
    }

    fn status_line(&self) -> String {
        let triangles = self
            .viewer
            .mesh()
            .and_then(|id| self.viewer.scene.object(id))
            .and_then(|object| self.viewer.scene.geometry(object.geometry))
            .map_or(0, |geometry| geometry.triangle_count());

        let pick = match &self.last_pick {
            Some(PickOutcome::Recolored { face, .. }) => format!("face {}", face.index),
            Some(PickOutcome::Missed) => "miss".to_string(),
            Some(PickOutcome::Skipped(e)) => format!("skipped ({})", e),
            None => "-".to_string(),
        };

        format!(
            "PickView | {} | {} tris | pick: {} | FPS: {:.1} | Click=Pick Drag=Orbit Wheel=Zoom Q=Quit",
            self.asset_status, triangles, pick, self.fps
        )
    }

    fn present(&mut self) -> ViewerResult<()> {
        let mut stdout = stdout();
        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetBackgroundColor(Color::Black),
            SetForegroundColor(Color::Yellow),
            Print(self.status_line()),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use nalgebra::Point3;
    use pickview_core::{MeshGeometry, OrbitControls, PerspectiveCamera};

    fn app_with_cube() -> TerminalApp {
        let config = ViewerConfig::default();
        let mut app = TerminalApp::with_size(
            &config,
            40,
            20,
            AssetLoad::ready(Ok(MeshGeometry::cube(2.0))),
        );
        let mut camera = PerspectiveCamera::new(45.0, 1.0, 0.1, 100.0);
        camera.position = Point3::new(0.0, 0.0, 5.0);
        app.viewer.camera = camera;
        app.viewer.controls = OrbitControls::new(Point3::origin());
        app
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_step_attaches_loaded_asset() {
        let mut app = app_with_cube();
        assert!(app.viewer().mesh().is_none());

        assert_eq!(app.step().unwrap(), FrameStatus::Continue);
        assert!(app.viewer().mesh().is_some());
        assert!(app.status_line().contains("12 tris"));
    }

    #[test]
    fn test_failed_asset_is_reported() {
        let mut app = TerminalApp::with_size(
            &ViewerConfig::default(),
            40,
            20,
            AssetLoad::ready(Err(pickview_core::ViewerError::EmptyMesh)),
        );
        app.step().unwrap();
        assert!(app.viewer().mesh().is_none());
        assert!(app.status_line().contains("failed"));
    }

    #[test]
    fn test_left_click_recolors() {
        let mut app = app_with_cube();
        app.step().unwrap();

        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 21, 9))
            .unwrap();
        assert!(matches!(
            app.last_pick(),
            Some(PickOutcome::Recolored { .. })
        ));
    }

    #[test]
    fn test_click_on_empty_cell_misses() {
        let mut app = app_with_cube();
        app.step().unwrap();

        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 0, 0))
            .unwrap();
        assert!(matches!(app.last_pick(), Some(PickOutcome::Missed)));
    }

    #[test]
    fn test_drag_orbits_camera() {
        let mut app = app_with_cube();
        app.step().unwrap();
        let before = app.viewer().camera.position;

        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 0, 0))
            .unwrap();
        app.handle_event(mouse(MouseEventKind::Drag(MouseButton::Left), 5, 0))
            .unwrap();
        app.handle_event(mouse(MouseEventKind::Up(MouseButton::Left), 5, 0))
            .unwrap();
        app.step().unwrap();

        let after = app.viewer().camera.position;
        assert!((after - before).norm() > 1e-3);
        let distance = (after - Point3::origin()).norm();
        assert!((distance - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_scroll_zooms() {
        let mut app = app_with_cube();
        app.step().unwrap();

        app.handle_event(mouse(MouseEventKind::ScrollUp, 10, 10)).unwrap();
        app.step().unwrap();
        assert!(app.viewer().camera.position.z < 5.0);
    }

    #[test]
    fn test_resize_event_resizes_buffer() {
        let mut app = app_with_cube();
        app.step().unwrap();
        app.handle_event(Event::Resize(60, 30)).unwrap();
        app.step().unwrap();
        assert_eq!(app.renderer().buffer_size(), (60, 30));
    }

    #[test]
    fn test_quit_key_stops_frames() {
        let mut app = app_with_cube();
        app.handle_event(key(KeyCode::Char('q'))).unwrap();
        assert_eq!(app.step().unwrap(), FrameStatus::Stopped);
    }
}
