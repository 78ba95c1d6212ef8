/// Rays, ray/triangle intersection and the reusable raycaster
use nalgebra::{Point2, Point3, Vector3};

use crate::error::ViewerResult;
use crate::geometry::{BoundingBox, Triangle};
use crate::projection::PerspectiveCamera;

/// A half-line with a normalized direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }

    /// Ray from the camera through a point given in normalized device coordinates.
    pub fn from_camera(ndc: &Point2<f32>, camera: &PerspectiveCamera) -> ViewerResult<Self> {
        let through = camera.unproject(&Point3::new(ndc.x, ndc.y, 0.5))?;
        Ok(Self::new(camera.position, through - camera.position))
    }

    /// Slab test; returns the entry distance (0 when starting inside).
    pub fn intersects_aabb(&self, bounds: &BoundingBox) -> Option<f32> {
        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;

        for i in 0..3 {
            let t1 = (bounds.min[i] - self.origin[i]) / self.direction[i];
            let t2 = (bounds.max[i] - self.origin[i]) / self.direction[i];

            tmin = tmin.max(t1.min(t2));
            tmax = tmax.min(t1.max(t2));
        }

        if tmax >= tmin && tmax >= 0.0 {
            Some(tmin.max(0.0))
        } else {
            None
        }
    }

    /// Möller–Trumbore intersection; returns the distance along the ray.
    ///
    /// With `cull_back_faces`, triangles wound clockwise as seen from the
    /// ray origin are ignored.
    pub fn intersect_triangle(&self, triangle: &Triangle, cull_back_faces: bool) -> Option<f32> {
        let [v0, v1, v2] = triangle.vertices;
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let normal = edge1.cross(&edge2);

        // Positive when the ray hits the back side
        let facing = self.direction.dot(&normal);
        if facing > 0.0 && cull_back_faces {
            return None;
        }
        if facing.abs() < 1e-12 {
            return None;
        }

        let p = self.direction.cross(&edge2);
        let det = edge1.dot(&p);
        let inv_det = 1.0 / det;

        let s = self.origin - v0;
        let u = s.dot(&p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = self.direction.dot(&q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(&q) * inv_det;
        if t < 0.0 {
            return None;
        }

        Some(t)
    }
}

/// Ray plus the distance window hits must fall into.
///
/// Kept between events so picking does not allocate per click.
#[derive(Debug, Clone)]
pub struct Raycaster {
    pub ray: Ray,
    pub near: f32,
    pub far: f32,
}

impl Raycaster {
    pub fn new() -> Self {
        Self {
            ray: Ray::new(Point3::origin(), -Vector3::z()),
            near: 0.0,
            far: f32::INFINITY,
        }
    }

    /// Aim the ray from the camera through the pointer position.
    pub fn set_from_camera(
        &mut self,
        pointer: &Point2<f32>,
        camera: &PerspectiveCamera,
    ) -> ViewerResult<()> {
        self.ray = Ray::from_camera(pointer, camera)?;
        Ok(())
    }

    pub fn accepts(&self, distance: f32) -> bool {
        distance >= self.near && distance <= self.far
    }
}

impl Default for Raycaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn unit_triangle(z: f32) -> Triangle {
        // Counter-clockwise when seen from +z
        Triangle::new(
            Point3::new(-1.0, -1.0, z),
            Point3::new(1.0, -1.0, z),
            Point3::new(0.0, 1.0, z),
        )
    }

    #[test]
    fn test_front_face_hit() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), -Vector3::z());
        let t = ray.intersect_triangle(&unit_triangle(0.0), true).unwrap();
        assert_abs_diff_eq!(t, 5.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ray.at(t), Point3::new(0.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_back_face_culling() {
        let ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Vector3::z());
        assert!(ray.intersect_triangle(&unit_triangle(0.0), true).is_none());
        assert!(ray.intersect_triangle(&unit_triangle(0.0), false).is_some());
    }

    #[test]
    fn test_miss_outside_and_behind() {
        let beside = Ray::new(Point3::new(3.0, 0.0, 5.0), -Vector3::z());
        assert!(beside.intersect_triangle(&unit_triangle(0.0), false).is_none());

        let away = Ray::new(Point3::new(0.0, 0.0, 5.0), Vector3::z());
        assert!(away.intersect_triangle(&unit_triangle(0.0), false).is_none());
    }

    #[test]
    fn test_parallel_ray_misses() {
        let ray = Ray::new(Point3::new(-5.0, 0.0, 0.0), Vector3::x());
        assert!(ray.intersect_triangle(&unit_triangle(0.0), false).is_none());
    }

    #[test]
    fn test_aabb() {
        let bounds = BoundingBox {
            min: Point3::new(-1.0, -1.0, -1.0),
            max: Point3::new(1.0, 1.0, 1.0),
        };
        let hit = Ray::new(Point3::new(0.0, 0.0, 5.0), -Vector3::z());
        assert_abs_diff_eq!(hit.intersects_aabb(&bounds).unwrap(), 4.0, epsilon = 1e-6);

        let miss = Ray::new(Point3::new(3.0, 0.0, 5.0), -Vector3::z());
        assert!(miss.intersects_aabb(&bounds).is_none());
    }

    #[test]
    fn test_center_pointer_follows_view_direction() {
        let camera = PerspectiveCamera::default();
        let mut raycaster = Raycaster::new();
        raycaster
            .set_from_camera(&Point2::origin(), &camera)
            .unwrap();

        assert_abs_diff_eq!(raycaster.ray.origin, camera.position);
        assert_abs_diff_eq!(raycaster.ray.direction, camera.direction(), epsilon = 1e-5);
    }
}
