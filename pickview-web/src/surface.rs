/// Canvas-backed render surface
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlCanvasElement, WebGl2RenderingContext};

use pickview_core::{PerspectiveCamera, RenderSurface, Scene, ViewerError, ViewerResult};

use crate::gl::GlRenderer;

/// A `<canvas>` whose drawing buffer tracks its CSS size
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    renderer: GlRenderer,
}

impl CanvasSurface {
    /// Create an antialiased WebGL2 context on the canvas.
    pub fn new(canvas: HtmlCanvasElement) -> ViewerResult<Self> {
        let options = js_sys::Object::new();
        js_sys::Reflect::set(&options, &"antialias".into(), &JsValue::TRUE)
            .map_err(|e| ViewerError::Render(format!("{:?}", e)))?;

        let gl = canvas
            .get_context_with_context_options("webgl2", &options)
            .map_err(|e| ViewerError::Render(format!("{:?}", e)))?
            .ok_or_else(|| ViewerError::Render("WebGL2 is not available".to_string()))?
            .dyn_into::<WebGl2RenderingContext>()
            .map_err(|_| ViewerError::Render("context is not WebGL2".to_string()))?;

        Ok(Self {
            canvas,
            renderer: GlRenderer::new(gl)?,
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl RenderSurface for CanvasSurface {
    fn display_size(&self) -> (u32, u32) {
        (
            self.canvas.client_width().max(0) as u32,
            self.canvas.client_height().max(0) as u32,
        )
    }

    fn buffer_size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn set_buffer_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.renderer.set_viewport(width, height);
    }

    fn render(&mut self, scene: &mut Scene, camera: &PerspectiveCamera) -> ViewerResult<()> {
        self.renderer.render(scene, camera)
    }
}
