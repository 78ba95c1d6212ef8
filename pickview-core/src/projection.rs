/// Perspective camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

use crate::error::{ViewerError, ViewerResult};

/// Perspective camera looking from `position` towards `target`.
///
/// The projection matrix is cached; call `update_projection_matrix` after
/// changing `fov`, `aspect`, `near` or `far`.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Matrix4<f32>,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::origin(),
            up: Vector3::y(),
            fov,
            aspect,
            near,
            far,
            projection: Matrix4::identity(),
        };
        camera.update_projection_matrix();
        camera
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    pub fn projection_matrix(&self) -> &Matrix4<f32> {
        &self.projection
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection =
            Matrix4::new_perspective(self.aspect, self.fov.to_radians(), self.near, self.far);
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }

    /// Unit vector the camera is looking along
    pub fn direction(&self) -> Vector3<f32> {
        (self.target - self.position)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| -Vector3::z())
    }

    /// Project a world-space point to normalized device coordinates.
    ///
    /// Returns `None` for points behind the camera or outside the near/far range.
    pub fn project(&self, point: &Point3<f32>) -> Option<Point3<f32>> {
        let clip = self.view_projection() * point.to_homogeneous();

        // Prevent division by near-zero depth values
        if clip.w <= 1e-6 {
            return None;
        }

        let ndc = Point3::new(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w);
        if !(-1.0..=1.0).contains(&ndc.z) {
            return None;
        }

        Some(ndc)
    }

    /// Convert an NDC depth back to distance along the view axis.
    pub fn linear_depth(&self, ndc_z: f32) -> f32 {
        let (n, f) = (self.near, self.far);
        2.0 * n * f / ((f + n) - ndc_z * (f - n))
    }

    /// Map a point in normalized device coordinates back to world space.
    pub fn unproject(&self, ndc: &Point3<f32>) -> ViewerResult<Point3<f32>> {
        let inverse = self
            .view_projection()
            .try_inverse()
            .ok_or(ViewerError::DegenerateCamera)?;

        let world = inverse * Vector4::new(ndc.x, ndc.y, ndc.z, 1.0);
        if world.w.abs() < f32::EPSILON {
            return Err(ViewerError::DegenerateCamera);
        }

        Ok(Point3::new(
            world.x / world.w,
            world.y / world.w,
            world.z / world.w,
        ))
    }
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(45.0, 2.0, 0.1, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_camera_creation() {
        let camera = PerspectiveCamera::default();
        assert_abs_diff_eq!(camera.aspect, 2.0);
        assert!(camera.projection_matrix().norm() > 0.0);
    }

    #[test]
    fn test_projection_is_cached_until_updated() {
        let mut camera = PerspectiveCamera::default();
        let before = *camera.projection_matrix();

        camera.aspect = 1.0;
        assert_eq!(*camera.projection_matrix(), before);

        camera.update_projection_matrix();
        assert_ne!(*camera.projection_matrix(), before);
    }

    #[test]
    fn test_target_projects_to_center() {
        let camera = PerspectiveCamera::default();
        let ndc = camera.project(&camera.target).unwrap();
        assert_abs_diff_eq!(ndc.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ndc.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_points_behind_are_rejected() {
        let camera = PerspectiveCamera::default();
        assert!(camera.project(&Point3::new(0.0, 0.0, 10.0)).is_none());
    }

    #[test]
    fn test_linear_depth() {
        let camera = PerspectiveCamera::default();
        let ndc = camera.project(&Point3::new(0.0, 0.0, 2.0)).unwrap();
        assert_abs_diff_eq!(camera.linear_depth(ndc.z), 3.0, epsilon = 1e-3);
        assert_abs_diff_eq!(camera.linear_depth(-1.0), camera.near, epsilon = 1e-6);
    }

    #[test]
    fn test_unproject_inverts_project() {
        let camera = PerspectiveCamera::default();
        let point = Point3::new(0.5, -0.25, 1.0);
        let ndc = camera.project(&point).unwrap();
        let back = camera.unproject(&ndc).unwrap();
        assert_abs_diff_eq!(back, point, epsilon = 1e-3);
    }
}
