//! Resize-aware, cancellable frame loop.
//!
//! Frontends own the actual scheduling (a timed loop in the terminal,
//! `requestAnimationFrame` in the browser) and call `FrameLoop::tick` once per
//! frame. Cancelling the token stops all further rendering.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::ViewerResult;
use crate::projection::PerspectiveCamera;
use crate::scene::Scene;

/// A drawable surface whose backing buffer may lag behind its displayed size
pub trait RenderSurface {
    /// Size the surface is displayed at
    fn display_size(&self) -> (u32, u32);

    /// Size of the buffer frames are rendered into
    fn buffer_size(&self) -> (u32, u32);

    fn set_buffer_size(&mut self, width: u32, height: u32);

    /// Aspect ratio the camera should use for the current display size.
    fn aspect(&self) -> f32 {
        let (width, height) = self.display_size();
        width as f32 / height as f32
    }

    /// Upload any dirty buffers and draw one frame.
    fn render(&mut self, scene: &mut Scene, camera: &PerspectiveCamera) -> ViewerResult<()>;
}

/// Match the backing buffer to the display size.
///
/// Returns true if the buffer was resized. Zero-area display sizes are ignored.
pub fn resize_to_display_size<S: RenderSurface + ?Sized>(surface: &mut S) -> bool {
    let (width, height) = surface.display_size();
    if width == 0 || height == 0 {
        return false;
    }

    let need_resize = surface.buffer_size() != (width, height);
    if need_resize {
        surface.set_buffer_size(width, height);
    }

    need_resize
}

/// Shared flag that stops a frame loop.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// A frame was rendered; schedule the next one.
    Continue,
    /// The loop was cancelled; do not schedule again.
    Stopped,
}

#[derive(Debug, Default)]
pub struct FrameLoop {
    token: CancellationToken,
    frames: u64,
    resizes: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that stops this loop when cancelled
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn resizes(&self) -> u64 {
        self.resizes
    }

    /// Render one frame, resizing the surface and camera first if needed.
    pub fn tick<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        scene: &mut Scene,
        camera: &mut PerspectiveCamera,
    ) -> ViewerResult<FrameStatus> {
        if self.token.is_cancelled() {
            return Ok(FrameStatus::Stopped);
        }

        if resize_to_display_size(surface) {
            camera.aspect = surface.aspect();
            camera.update_projection_matrix();
            self.resizes += 1;
            log::debug!(
                "surface resized to {:?}, aspect {:.3}",
                surface.buffer_size(),
                camera.aspect
            );
        }

        surface.render(scene, camera)?;
        self.frames += 1;

        Ok(FrameStatus::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[derive(Default)]
    struct FakeSurface {
        display: (u32, u32),
        buffer: (u32, u32),
        rendered: usize,
    }

    impl RenderSurface for FakeSurface {
        fn display_size(&self) -> (u32, u32) {
            self.display
        }

        fn buffer_size(&self) -> (u32, u32) {
            self.buffer
        }

        fn set_buffer_size(&mut self, width: u32, height: u32) {
            self.buffer = (width, height);
        }

        fn render(&mut self, _scene: &mut Scene, _camera: &PerspectiveCamera) -> ViewerResult<()> {
            self.rendered += 1;
            Ok(())
        }
    }

    #[test]
    fn test_resize_only_when_size_changes() {
        let mut surface = FakeSurface {
            display: (300, 150),
            ..Default::default()
        };
        let mut scene = Scene::default();
        let mut camera = PerspectiveCamera::new(45.0, 1.0, 0.1, 100.0);
        let mut frames = FrameLoop::new();

        frames.tick(&mut surface, &mut scene, &mut camera).unwrap();
        assert_abs_diff_eq!(camera.aspect, 2.0);
        assert_eq!(frames.resizes(), 1);

        let projection = *camera.projection_matrix();
        frames.tick(&mut surface, &mut scene, &mut camera).unwrap();
        assert_eq!(frames.resizes(), 1);
        assert_eq!(*camera.projection_matrix(), projection);

        surface.display = (400, 100);
        frames.tick(&mut surface, &mut scene, &mut camera).unwrap();
        frames.tick(&mut surface, &mut scene, &mut camera).unwrap();
        assert_abs_diff_eq!(camera.aspect, 4.0);
        assert_eq!(frames.resizes(), 2);
        assert_eq!(surface.buffer, (400, 100));
        assert_eq!(surface.rendered, 4);
    }

    #[test]
    fn test_zero_area_display_is_ignored() {
        let mut surface = FakeSurface {
            display: (0, 120),
            buffer: (10, 10),
            ..Default::default()
        };
        assert!(!resize_to_display_size(&mut surface));
        assert_eq!(surface.buffer, (10, 10));
    }

    #[test]
    fn test_cancelled_loop_renders_nothing() {
        let mut surface = FakeSurface {
            display: (100, 100),
            ..Default::default()
        };
        let mut scene = Scene::default();
        let mut camera = PerspectiveCamera::default();
        let mut frames = FrameLoop::new();

        assert_eq!(
            frames.tick(&mut surface, &mut scene, &mut camera).unwrap(),
            FrameStatus::Continue
        );

        frames.token().cancel();
        assert!(!frames.is_running());
        assert_eq!(
            frames.tick(&mut surface, &mut scene, &mut camera).unwrap(),
            FrameStatus::Stopped
        );
        assert_eq!(surface.rendered, 1);
        assert_eq!(frames.frames(), 1);
    }
}
