//! Viewer configuration.
//!
//! Every field has a default, so an empty TOML document describes the stock
//! demo scene. Colors are written as `0xRRGGBB` sRGB integers.

use std::fs;
use std::path::Path;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::ViewerResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Scene background, `0xRRGGBB`
    pub background: u32,
    pub asset: AssetConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub lights: LightsConfig,
    pub pick: PickConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LightsConfig {
    pub hemisphere: HemisphereConfig,
    pub directional: DirectionalConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HemisphereConfig {
    pub sky: u32,
    pub ground: u32,
    pub intensity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalConfig {
    pub color: u32,
    pub intensity: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

/// Color written into picked triangles, as HSL in sRGB space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickConfig {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl ViewerConfig {
    pub fn from_toml_str(text: &str) -> ViewerResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> ViewerResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn background_color(&self) -> Color {
        Color::from_hex(self.background)
    }

    pub fn pick_color(&self) -> Color {
        Color::from_hsl(self.pick.hue, self.pick.saturation, self.pick.lightness)
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            background: 0x000000,
            asset: AssetConfig::default(),
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            lights: LightsConfig::default(),
            pick: PickConfig::default(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            path: "public/monkey.obj".to_string(),
        }
    }
}

impl CameraConfig {
    pub fn position(&self) -> Point3<f32> {
        Point3::from(self.position)
    }

    pub fn target(&self) -> Point3<f32> {
        Point3::from(self.target)
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 45.0,
            aspect: 2.0,
            near: 0.1,
            far: 100.0,
            position: [0.0, 10.0, 0.0],
            target: [0.0, 5.0, 0.0],
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

impl Default for HemisphereConfig {
    fn default() -> Self {
        Self {
            sky: 0xB1E1FF,    // light blue
            ground: 0xB97A20, // brownish orange
            intensity: 2.0,
        }
    }
}

impl Default for DirectionalConfig {
    fn default() -> Self {
        Self {
            color: 0xFFFFFF,
            intensity: 2.5,
            position: [0.0, 10.0, 0.0],
            target: [-5.0, 0.0, 0.0],
        }
    }
}

impl Default for PickConfig {
    fn default() -> Self {
        Self {
            hue: 0.9,
            saturation: 0.5,
            lightness: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ViewerError;

    #[test]
    fn test_empty_document_is_the_demo() {
        let config = ViewerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.asset.path, "public/monkey.obj");
        assert_eq!(config.camera.position(), Point3::new(0.0, 10.0, 0.0));
    }

    #[test]
    fn test_partial_override() {
        let config = ViewerConfig::from_toml_str(
            r#"
background = 0x202020

[asset]
path = "models/teapot.stl"

[camera]
fov = 60.0

[lights.hemisphere]
intensity = 1.0
"#,
        )
        .unwrap();

        assert_eq!(config.background, 0x202020);
        assert_eq!(config.asset.path, "models/teapot.stl");
        assert_eq!(config.camera.fov, 60.0);
        assert_eq!(config.camera.far, 100.0);
        assert_eq!(config.lights.hemisphere.intensity, 1.0);
        assert_eq!(config.lights.hemisphere.sky, 0xB1E1FF);
    }

    #[test]
    fn test_malformed_config_is_rejected() {
        let result = ViewerConfig::from_toml_str("[camera]\nfov = \"wide\"\n");
        assert!(matches!(result, Err(ViewerError::Config(_))));
    }

    #[test]
    fn test_pick_color_from_hsl() {
        let config = ViewerConfig::default();
        assert_eq!(config.pick_color(), Color::from_hsl(0.9, 0.5, 0.5));
    }
}
