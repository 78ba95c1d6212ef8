/// Scene lights and the flat Lambert shading both renderers share
use std::f32::consts::PI;

use nalgebra::{Point3, Vector3};

use crate::color::Color;

/// Sky/ground gradient light, blended by how much a surface faces +Y
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HemisphereLight {
    pub sky_color: Color,
    pub ground_color: Color,
    pub intensity: f32,
    pub up: Vector3<f32>,
}

impl HemisphereLight {
    pub fn new(sky_color: Color, ground_color: Color, intensity: f32) -> Self {
        Self {
            sky_color,
            ground_color,
            intensity,
            up: Vector3::y(),
        }
    }

    pub fn irradiance(&self, normal: &Vector3<f32>) -> Color {
        let weight = 0.5 * normal.dot(&self.up) + 0.5;
        self.ground_color
            .lerp(self.sky_color, weight)
            .scale(self.intensity)
    }
}

/// Parallel light shining from `position` towards `target`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl DirectionalLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            position: Point3::new(0.0, 1.0, 0.0),
            target: Point3::origin(),
        }
    }

    /// Unit vector from the surface towards the light
    pub fn direction(&self) -> Vector3<f32> {
        (self.position - self.target)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::y)
    }

    pub fn irradiance(&self, normal: &Vector3<f32>) -> Color {
        let dot_nl = normal.dot(&self.direction()).max(0.0);
        self.color.scale(dot_nl * self.intensity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Hemisphere(HemisphereLight),
    Directional(DirectionalLight),
}

impl Light {
    pub fn irradiance(&self, normal: &Vector3<f32>) -> Color {
        match self {
            Light::Hemisphere(light) => light.irradiance(normal),
            Light::Directional(light) => light.irradiance(normal),
        }
    }
}

/// Lambert reflectance for a flat-shaded face, in linear space.
pub fn shade_flat(normal: &Vector3<f32>, albedo: Color, lights: &[Light]) -> Color {
    let irradiance = lights
        .iter()
        .fold(Color::BLACK, |sum, light| sum + light.irradiance(normal));
    (albedo * irradiance).scale(1.0 / PI)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_hemisphere_blend() {
        let light = HemisphereLight::new(Color::WHITE, Color::BLACK, 2.0);
        assert_abs_diff_eq!(light.irradiance(&Vector3::y()).r, 2.0);
        assert_abs_diff_eq!(light.irradiance(&-Vector3::y()).r, 0.0);
        assert_abs_diff_eq!(light.irradiance(&Vector3::x()).r, 1.0);
    }

    #[test]
    fn test_directional_ignores_back_faces() {
        let mut light = DirectionalLight::new(Color::WHITE, 2.5);
        light.position = Point3::new(0.0, 10.0, 0.0);
        light.target = Point3::new(-5.0, 0.0, 0.0);

        let lit = light.irradiance(&light.direction());
        assert_abs_diff_eq!(lit.g, 2.5, epsilon = 1e-6);
        assert_eq!(light.irradiance(&-light.direction()), Color::BLACK);
    }

    #[test]
    fn test_shade_flat_sums_lights() {
        let lights = [
            Light::Hemisphere(HemisphereLight::new(Color::WHITE, Color::WHITE, 1.0)),
            Light::Directional(DirectionalLight::new(Color::WHITE, 1.0)),
        ];
        let shaded = shade_flat(&Vector3::y(), Color::WHITE, &lights);
        assert_abs_diff_eq!(shaded.r, 2.0 / PI, epsilon = 1e-6);

        let dark = shade_flat(&Vector3::y(), Color::BLACK, &lights);
        assert_eq!(dark, Color::BLACK);
    }
}
