//! Orbit controls: rotate around a target, dolly in/out and pan.
//!
//! Input handlers only accumulate deltas; `update` applies them to the
//! camera. The up axis is +Y.

use std::f32::consts::PI;

use nalgebra::{Point3, Vector3};

use crate::projection::PerspectiveCamera;

const EPS: f32 = 1e-6;

/// Spherical coordinates with +Y as the polar axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    /// Polar angle from +Y
    pub phi: f32,
    /// Azimuth around +Y, measured from +Z towards +X
    pub theta: f32,
}

impl Spherical {
    pub fn from_offset(offset: &Vector3<f32>) -> Self {
        let radius = offset.norm();
        if radius == 0.0 {
            return Self {
                radius: 0.0,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            theta: offset.x.atan2(offset.z),
        }
    }

    pub fn to_offset(&self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Keep phi away from the poles so the view matrix stays well defined.
    pub fn make_safe(&mut self) {
        self.phi = self.phi.clamp(EPS, PI - EPS);
    }
}

/// Camera orbit state bound to one camera
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Point3<f32>,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    spherical_delta: Spherical,
    scale: f32,
    pan_offset: Vector3<f32>,
}

impl OrbitControls {
    pub fn new(target: Point3<f32>) -> Self {
        Self {
            target,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            spherical_delta: Spherical {
                radius: 0.0,
                phi: 0.0,
                theta: 0.0,
            },
            scale: 1.0,
            pan_offset: Vector3::zeros(),
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    /// Rotate from a pointer drag of `(dx, dy)` pixels on a surface `height` pixels tall.
    pub fn rotate_by_drag(&mut self, dx: f32, dy: f32, height: f32) {
        if height <= 0.0 {
            return;
        }
        self.rotate_left(2.0 * PI * dx / height * self.rotate_speed);
        self.rotate_up(2.0 * PI * dy / height * self.rotate_speed);
    }

    pub fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.zoom_speed)
    }

    /// Move towards the target
    pub fn dolly_in(&mut self, scale: f32) {
        self.scale *= scale;
    }

    /// Move away from the target
    pub fn dolly_out(&mut self, scale: f32) {
        self.scale /= scale;
    }

    /// Wheel handling: negative deltas zoom in, positive zoom out.
    pub fn wheel(&mut self, delta_y: f32) {
        if delta_y < 0.0 {
            self.dolly_in(self.zoom_scale());
        } else if delta_y > 0.0 {
            self.dolly_out(self.zoom_scale());
        }
    }

    /// Pan from a pointer drag of `(dx, dy)` pixels on a surface `height` pixels tall.
    pub fn pan_by_drag(&mut self, camera: &PerspectiveCamera, dx: f32, dy: f32, height: f32) {
        if height <= 0.0 {
            return;
        }
        let offset = camera.position - camera.target;
        // Half of the fov is center to top of screen
        let target_distance = offset.norm() * (camera.fov.to_radians() / 2.0).tan();
        let left = 2.0 * dx * target_distance / height * self.pan_speed;
        let up = 2.0 * dy * target_distance / height * self.pan_speed;

        let forward = camera.direction();
        let right = forward
            .cross(&camera.up)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::x);
        let screen_up = right.cross(&forward);

        self.pan_offset += -right * left + screen_up * up;
    }

    /// Apply accumulated input to the camera. Returns true if the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_offset(&offset);

        spherical.theta += self.spherical_delta.theta;
        spherical.phi += self.spherical_delta.phi;
        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle);
        spherical.make_safe();

        spherical.radius = (spherical.radius * self.scale)
            .clamp(self.min_distance, self.max_distance);

        self.target += self.pan_offset;

        let position = self.target + spherical.to_offset();
        let moved = (position - camera.position).norm_squared() > EPS * EPS
            || camera.target != self.target;

        camera.position = position;
        camera.target = self.target;

        self.spherical_delta = Spherical {
            radius: 0.0,
            phi: 0.0,
            theta: 0.0,
        };
        self.scale = 1.0;
        self.pan_offset = Vector3::zeros();

        moved
    }
}
