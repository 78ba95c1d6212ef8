//! The demo scene and the state a frontend drives.
//!
//! Frontends load the asset however suits them and hand the result to
//! `Viewer::on_asset_loaded`; pointer-downs go to `Viewer::on_pointer_down`
//! and each display refresh to `Viewer::frame`.

use crate::color::Color;
use crate::config::ViewerConfig;
use crate::error::ViewerResult;
use crate::frame::{FrameLoop, FrameStatus, RenderSurface};
use crate::geometry::MeshGeometry;
use crate::lighting::{DirectionalLight, HemisphereLight, Light};
use crate::orbit::OrbitControls;
use crate::picking::{PickContext, PickOutcome, PointerEvent};
use crate::projection::PerspectiveCamera;
use crate::scene::{Material, ObjectId, PhongMaterial, Scene, Side, WireframeMaterial};

pub struct Viewer {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub picking: PickContext,
    pub frames: FrameLoop,
    asset_path: String,
    mesh: Option<ObjectId>,
}

impl Viewer {
    /// Build camera, controls and lights. The mesh is attached later.
    pub fn bootstrap(config: &ViewerConfig) -> Self {
        let mut camera = PerspectiveCamera::new(
            config.camera.fov,
            config.camera.aspect,
            config.camera.near,
            config.camera.far,
        );
        camera.position = config.camera.position();

        let mut controls = OrbitControls::new(config.camera.target());
        controls.rotate_speed = config.controls.rotate_speed;
        controls.zoom_speed = config.controls.zoom_speed;
        controls.pan_speed = config.controls.pan_speed;
        controls.update(&mut camera);

        let mut scene = Scene::new(config.background_color());

        let hemisphere = &config.lights.hemisphere;
        scene.add_light(Light::Hemisphere(HemisphereLight::new(
            Color::from_hex(hemisphere.sky),
            Color::from_hex(hemisphere.ground),
            hemisphere.intensity,
        )));

        let directional = &config.lights.directional;
        let mut sun = DirectionalLight::new(Color::from_hex(directional.color), directional.intensity);
        sun.position = directional.position.into();
        sun.target = directional.target.into();
        scene.add_light(Light::Directional(sun));

        Self {
            scene,
            camera,
            controls,
            picking: PickContext::new(config.pick_color()),
            frames: FrameLoop::new(),
            asset_path: config.asset.path.clone(),
            mesh: None,
        }
    }

    pub fn asset_path(&self) -> &str {
        &self.asset_path
    }

    /// The shaded mesh, once the asset has loaded
    pub fn mesh(&self) -> Option<ObjectId> {
        self.mesh
    }

    /// Completion callback for the asynchronous asset load.
    ///
    /// A failed load leaves the scene without a mesh and is not retried.
    pub fn on_asset_loaded(&mut self, result: ViewerResult<MeshGeometry>) -> Option<ObjectId> {
        match result {
            Ok(geometry) => {
                log::info!(
                    "loaded '{}': {} triangles",
                    self.asset_path,
                    geometry.triangle_count()
                );
                self.attach_loaded_mesh(geometry)
            }
            Err(e) => {
                log::warn!("failed to load '{}': {}", self.asset_path, e);
                None
            }
        }
    }

    /// Add the mesh with white vertex colors plus a wireframe overlay sharing its geometry.
    pub fn attach_loaded_mesh(&mut self, mut geometry: MeshGeometry) -> Option<ObjectId> {
        geometry.set_color_attribute(Color::WHITE);
        let geometry = self.scene.add_geometry(geometry);

        let material = Material::Phong(PhongMaterial {
            color: Color::WHITE,
            flat_shading: true,
            vertex_colors: true,
            shininess: 0.0,
            side: Side::Front,
        });
        let wireframe = Material::Wireframe(WireframeMaterial {
            color: Color::BLACK,
            opacity: 1.0,
            transparent: true,
            side: Side::Front,
        });

        let mesh = self.scene.add_mesh("mesh", geometry, material, None)?;
        self.scene
            .add_mesh("wireframe", geometry, wireframe, Some(mesh))?;

        self.mesh = Some(mesh);
        Some(mesh)
    }

    pub fn on_pointer_down(
        &mut self,
        event: &PointerEvent,
        width: f32,
        height: f32,
    ) -> ViewerResult<PickOutcome> {
        self.picking
            .on_pointer_down(event, width, height, &self.camera, &mut self.scene)
    }

    /// Apply pending control input, then resize and render one frame.
    pub fn frame<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) -> ViewerResult<FrameStatus> {
        if !self.frames.is_running() {
            return Ok(FrameStatus::Stopped);
        }
        self.controls.update(&mut self.camera);
        self.frames.tick(surface, &mut self.scene, &mut self.camera)
    }
}
