/// PickView Web - WebGL2 mesh viewer with click-to-paint triangles
///
/// Renders into the `#c` canvas. A pointer-down anywhere in the window
/// recolors the triangle under it; dragging on the canvas orbits (left) or
/// pans (right), and the wheel zooms.
use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Event, EventTarget, HtmlCanvasElement, PointerEvent as DomPointerEvent, Response, WheelEvent};

use pickview_core::{
    parse_mesh, CancellationToken, FrameStatus, MeshFormat, PointerEvent, Viewer, ViewerConfig,
    ViewerError,
};

pub mod buffers;
pub mod gl;
pub mod surface;

use surface::CanvasSurface;

/// Everything the event handlers and the frame callback share
struct App {
    viewer: Viewer,
    surface: CanvasSurface,
    drag: Option<Drag>,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    button: i16,
    x: f32,
    y: f32,
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    // A logger may already be installed by an earlier module instance
    let _ = console_log::init_with_level(log::Level::Info);
    Ok(())
}

/// Handle to a running viewer
#[wasm_bindgen]
pub struct WebViewer {
    state: Rc<RefCell<App>>,
    token: CancellationToken,
}

#[wasm_bindgen]
impl WebViewer {
    /// Start the viewer on `#c`, optionally configured by a TOML document.
    #[wasm_bindgen(constructor)]
    pub fn new(config_toml: Option<String>) -> Result<WebViewer, JsValue> {
        let config = match config_toml {
            Some(text) => ViewerConfig::from_toml_str(&text).map_err(to_js)?,
            None => ViewerConfig::default(),
        };

        let window = web_sys::window().ok_or("no global window")?;
        let document = window.document().ok_or("no document")?;
        let canvas = document
            .query_selector("#c")?
            .ok_or("canvas #c not found")?
            .dyn_into::<HtmlCanvasElement>()?;

        let surface = CanvasSurface::new(canvas.clone()).map_err(to_js)?;
        let viewer = Viewer::bootstrap(&config);
        let token = viewer.frames.token();
        let asset_url = viewer.asset_path().to_string();

        let state = Rc::new(RefCell::new(App {
            viewer,
            surface,
            drag: None,
        }));

        install_handlers(&state, &window, &canvas)?;
        load_asset(state.clone(), asset_url);
        start_frame_loop(state.clone())?;

        Ok(WebViewer { state, token })
    }

    /// Stop rendering. The canvas keeps its last frame.
    pub fn stop(&self) {
        self.token.cancel();
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Triangles in the loaded mesh, or 0 while loading
    #[wasm_bindgen(js_name = triangleCount)]
    pub fn triangle_count(&self) -> usize {
        let app = self.state.borrow();
        let scene = &app.viewer.scene;
        app.viewer
            .mesh()
            .and_then(|id| scene.object(id))
            .and_then(|object| scene.geometry(object.geometry))
            .map_or(0, |geometry| geometry.triangle_count())
    }
}

fn to_js(error: ViewerError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn listen(
    target: &EventTarget,
    name: &str,
    handler: impl FnMut(Event) + 'static,
) -> Result<(), JsValue> {
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
    // Listeners live as long as the page
    closure.forget();
    Ok(())
}

fn window_size() -> (f32, f32) {
    let Some(window) = web_sys::window() else {
        return (0.0, 0.0);
    };
    let dimension = |value: Result<JsValue, JsValue>| {
        value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as f32
    };
    (dimension(window.inner_width()), dimension(window.inner_height()))
}

fn install_handlers(
    state: &Rc<RefCell<App>>,
    window: &web_sys::Window,
    canvas: &HtmlCanvasElement,
) -> Result<(), JsValue> {
    // Picking uses the window's client area, matching the full-window canvas
    let app = state.clone();
    listen(window, "pointerdown", move |event| {
        let Some(event) = event.dyn_ref::<DomPointerEvent>() else {
            return;
        };
        let (width, height) = window_size();
        let pointer = PointerEvent {
            client_x: event.client_x() as f32,
            client_y: event.client_y() as f32,
        };

        match app.borrow_mut().viewer.on_pointer_down(&pointer, width, height) {
            Ok(outcome) => log::debug!("pick: {:?}", outcome),
            Err(e) => log::warn!("pick failed: {}", e),
        }
    })?;

    let app = state.clone();
    listen(canvas, "pointerdown", move |event| {
        let Some(event) = event.dyn_ref::<DomPointerEvent>() else {
            return;
        };
        app.borrow_mut().drag = Some(Drag {
            button: event.button(),
            x: event.client_x() as f32,
            y: event.client_y() as f32,
        });
    })?;

    let app = state.clone();
    listen(window, "pointermove", move |event| {
        let Some(event) = event.dyn_ref::<DomPointerEvent>() else {
            return;
        };
        let mut app = app.borrow_mut();
        let Some(drag) = app.drag else {
            return;
        };

        let (x, y) = (event.client_x() as f32, event.client_y() as f32);
        let (dx, dy) = (x - drag.x, y - drag.y);
        let height = app.surface.canvas().client_height() as f32;

        let App { viewer, .. } = &mut *app;
        match drag.button {
            0 => viewer.controls.rotate_by_drag(dx, dy, height),
            1 | 2 => viewer.controls.pan_by_drag(&viewer.camera, dx, dy, height),
            _ => {}
        }
        app.drag = Some(Drag { x, y, ..drag });
    })?;

    let app = state.clone();
    listen(window, "pointerup", move |_| {
        app.borrow_mut().drag = None;
    })?;

    listen(canvas, "contextmenu", |event| event.prevent_default())?;

    let app = state.clone();
    listen(canvas, "wheel", move |event| {
        let Some(event) = event.dyn_ref::<WheelEvent>() else {
            return;
        };
        event.prevent_default();
        app.borrow_mut().viewer.controls.wheel(event.delta_y() as f32);
    })?;

    Ok(())
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>, JsValue> {
    let window = web_sys::window().ok_or("no global window")?;
    let response: Response = JsFuture::from(window.fetch_with_str(url))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
    }

    let buffer = JsFuture::from(response.array_buffer()?).await?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

/// Fetch and parse the asset without blocking the frame loop.
fn load_asset(state: Rc<RefCell<App>>, url: String) {
    spawn_local(async move {
        log::info!("loading '{}'", url);
        let result = match fetch_bytes(&url).await {
            Ok(bytes) => MeshFormat::from_path(&url).and_then(|format| parse_mesh(&bytes, format)),
            Err(e) => Err(ViewerError::Fetch(format!("{:?}", e))),
        };
        state.borrow_mut().viewer.on_asset_loaded(result);
    });
}

fn request_animation_frame(callback: &FrameCallback) -> Result<i32, JsValue> {
    let window = web_sys::window().ok_or("no global window")?;
    let callback = callback.borrow();
    let closure = callback.as_ref().ok_or("frame callback dropped")?;
    window.request_animation_frame(closure.as_ref().unchecked_ref())
}

fn start_frame_loop(state: Rc<RefCell<App>>) -> Result<(), JsValue> {
    let callback: FrameCallback = Rc::new(RefCell::new(None));
    let handle = callback.clone();

    *handle.borrow_mut() = Some(Closure::new(move || {
        let status = {
            let mut app = state.borrow_mut();
            let App {
                viewer, surface, ..
            } = &mut *app;
            viewer.frame(surface)
        };

        let keep_going = match status {
            Ok(FrameStatus::Continue) => true,
            Ok(FrameStatus::Stopped) => {
                log::info!("frame loop stopped");
                false
            }
            Err(e) => {
                log::error!("render failed, stopping: {}", e);
                state.borrow().viewer.frames.token().cancel();
                false
            }
        };

        if keep_going {
            if let Err(e) = request_animation_frame(&callback) {
                log::error!("requestAnimationFrame failed: {:?}", e);
            }
        } else {
            // Drop our own closure; nothing references it after this frame
            let _ = callback.borrow_mut().take();
        }
    }));

    request_animation_frame(&handle).map(|_| ())
}
