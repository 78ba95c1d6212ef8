//! CPU-side vertex data and light uniforms for the WebGL renderer.
//!
//! Kept free of `web_sys` so it can be tested natively.

use pickview_core::geometry::ColorAttribute;
use pickview_core::lighting::Light;
use pickview_core::MeshGeometry;

/// Lights of each kind the shader accepts
pub const MAX_LIGHTS: usize = 4;

pub fn position_data(geometry: &MeshGeometry) -> Vec<f32> {
    geometry
        .positions()
        .iter()
        .flat_map(|p| [p.x, p.y, p.z])
        .collect()
}

pub fn color_data(colors: &ColorAttribute) -> Vec<f32> {
    colors.as_slice().iter().flat_map(|c| c.to_array()).collect()
}

/// Two endpoints per triangle edge, for drawing with `LINES`.
pub fn wireframe_data(geometry: &MeshGeometry) -> Vec<f32> {
    let mut data = Vec::with_capacity(geometry.triangle_count() * 18);
    for triangle in geometry.triangles() {
        let [a, b, c] = triangle.vertices;
        for (from, to) in [(a, b), (b, c), (c, a)] {
            data.extend_from_slice(&[from.x, from.y, from.z, to.x, to.y, to.z]);
        }
    }
    data
}

/// Flattened light parameters with intensity folded into the colors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightUniforms {
    pub hemisphere_count: i32,
    pub sky: Vec<f32>,
    pub ground: Vec<f32>,
    pub up: Vec<f32>,
    pub directional_count: i32,
    pub directional_color: Vec<f32>,
    /// Unit vectors towards each light
    pub directional_direction: Vec<f32>,
}

impl LightUniforms {
    pub fn from_lights(lights: &[Light]) -> Self {
        let mut uniforms = Self::default();

        for light in lights {
            match light {
                Light::Hemisphere(hemi) if (uniforms.hemisphere_count as usize) < MAX_LIGHTS => {
                    uniforms
                        .sky
                        .extend(hemi.sky_color.scale(hemi.intensity).to_array());
                    uniforms
                        .ground
                        .extend(hemi.ground_color.scale(hemi.intensity).to_array());
                    uniforms.up.extend([hemi.up.x, hemi.up.y, hemi.up.z]);
                    uniforms.hemisphere_count += 1;
                }
                Light::Directional(dir) if (uniforms.directional_count as usize) < MAX_LIGHTS => {
                    let direction = dir.direction();
                    uniforms
                        .directional_color
                        .extend(dir.color.scale(dir.intensity).to_array());
                    uniforms
                        .directional_direction
                        .extend([direction.x, direction.y, direction.z]);
                    uniforms.directional_count += 1;
                }
                _ => log::warn!("light dropped: more than {} of one kind", MAX_LIGHTS),
            }
        }

        // Uniform arrays are uploaded whole
        for array in [
            &mut uniforms.sky,
            &mut uniforms.ground,
            &mut uniforms.up,
            &mut uniforms.directional_color,
            &mut uniforms.directional_direction,
        ] {
            array.resize(MAX_LIGHTS * 3, 0.0);
        }

        uniforms
    }
}
