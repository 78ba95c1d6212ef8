//! Pointer picking: turn a pointer-down into a recolored triangle.

use nalgebra::Point2;

use crate::color::Color;
use crate::error::{PickError, ViewerResult};
use crate::geometry::Face;
use crate::projection::PerspectiveCamera;
use crate::ray::Raycaster;
use crate::scene::{GeometryId, Intersection, ObjectId, Scene};

/// Pointer position in client pixels, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub client_x: f32,
    pub client_y: f32,
}

/// What a pointer-down did to the scene
#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    /// The nearest triangle's three vertices were recolored.
    Recolored { object: ObjectId, face: Face },
    /// The ray hit nothing.
    Missed,
    /// The nearest hit could not be recolored; the scene is unchanged.
    Skipped(PickError),
}

/// A resolved recolor target: the geometry to write and the face inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickTarget {
    pub object: ObjectId,
    pub geometry: GeometryId,
    pub face: Face,
}

/// Convert client pixels to normalized device coordinates.
pub fn pointer_to_ndc(event: &PointerEvent, width: f32, height: f32) -> Point2<f32> {
    Point2::new(
        (event.client_x / width) * 2.0 - 1.0,
        -(event.client_y / height) * 2.0 + 1.0,
    )
}

/// Check that an intersection names a triangle with recolorable vertices.
pub fn resolve_target(scene: &Scene, hit: &Intersection) -> Result<PickTarget, PickError> {
    let face = hit.face.ok_or(PickError::MissingFace)?;
    let object = scene
        .object(hit.object)
        .ok_or(PickError::UnknownObject(hit.object))?;

    if !object.material.uses_vertex_colors() {
        return Err(PickError::NoColorAttribute(hit.object));
    }

    let geometry = scene
        .geometry(object.geometry)
        .ok_or(PickError::UnknownObject(hit.object))?;
    let colors = geometry
        .colors()
        .ok_or(PickError::NoColorAttribute(hit.object))?;

    let vertices = geometry.vertex_count().min(colors.len());
    if face.vertices().iter().any(|&v| v >= vertices) {
        return Err(PickError::FaceOutOfRange {
            face: face.index,
            vertices,
        });
    }

    Ok(PickTarget {
        object: hit.object,
        geometry: object.geometry,
        face,
    })
}

/// Reusable picking state: the raycaster, the last pointer position and
/// the color written into picked triangles.
#[derive(Debug, Clone)]
pub struct PickContext {
    pub raycaster: Raycaster,
    pub pointer: Point2<f32>,
    pub color: Color,
}

impl PickContext {
    pub fn new(color: Color) -> Self {
        Self {
            raycaster: Raycaster::new(),
            pointer: Point2::origin(),
            color,
        }
    }

    /// Handle a pointer-down on a viewport of `width` x `height` client pixels.
    ///
    /// Only the nearest hit is considered. Errors are reserved for a camera
    /// that cannot produce a ray; unusable hits come back as `Skipped`.
    pub fn on_pointer_down(
        &mut self,
        event: &PointerEvent,
        width: f32,
        height: f32,
        camera: &PerspectiveCamera,
        scene: &mut Scene,
    ) -> ViewerResult<PickOutcome> {
        if width <= 0.0 || height <= 0.0 {
            return Ok(PickOutcome::Missed);
        }

        self.pointer = pointer_to_ndc(event, width, height);
        self.raycaster.set_from_camera(&self.pointer, camera)?;

        let hits = scene.intersect(&self.raycaster);
        for hit in &hits {
            log::debug!(
                "intersection: object {:?} face {:?} at distance {:.4} point {:?}",
                hit.object,
                hit.face,
                hit.distance,
                hit.point
            );
        }

        let Some(nearest) = hits.first() else {
            return Ok(PickOutcome::Missed);
        };

        let target = match resolve_target(scene, nearest) {
            Ok(target) => target,
            Err(e) => {
                log::debug!("pick skipped: {}", e);
                return Ok(PickOutcome::Skipped(e));
            }
        };

        Ok(self.recolor(scene, &target))
    }

    fn recolor(&self, scene: &mut Scene, target: &PickTarget) -> PickOutcome {
        let colors = scene
            .geometry_mut(target.geometry)
            .and_then(|geometry| geometry.colors_mut());
        let Some(colors) = colors else {
            return PickOutcome::Skipped(PickError::NoColorAttribute(target.object));
        };

        for vertex in target.face.vertices() {
            colors.set(vertex, self.color);
        }
        colors.mark_needs_update();

        PickOutcome::Recolored {
            object: target.object,
            face: target.face,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{MeshGeometry, Triangle};
    use crate::scene::{Material, PhongMaterial, Side, WireframeMaterial};
    use approx::assert_abs_diff_eq;
    use nalgebra::Point3;

    const PICK: Color = Color::new(1.0, 0.0, 0.5);

    fn phong(vertex_colors: bool) -> Material {
        Material::Phong(PhongMaterial {
            color: Color::WHITE,
            flat_shading: true,
            vertex_colors,
            shininess: 0.0,
            side: Side::Front,
        })
    }

    fn wireframe() -> Material {
        Material::Wireframe(WireframeMaterial {
            color: Color::BLACK,
            opacity: 1.0,
            transparent: true,
            side: Side::Front,
        })
    }

    /// Two side-by-side triangles facing +z, the left one under the screen center
    fn two_triangles() -> MeshGeometry {
        let mut geometry = MeshGeometry::new();
        geometry.push_triangle(Triangle::new(
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ));
        geometry.push_triangle(Triangle::new(
            Point3::new(2.0, -1.0, 0.0),
            Point3::new(4.0, -1.0, 0.0),
            Point3::new(3.0, 1.0, 0.0),
        ));
        geometry.set_color_attribute(Color::WHITE);
        geometry
    }

    fn camera() -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(45.0, 1.0, 0.1, 100.0);
        camera.position = Point3::new(0.0, 0.0, 5.0);
        camera.target = Point3::origin();
        camera
    }

    fn center() -> PointerEvent {
        PointerEvent {
            client_x: 50.0,
            client_y: 50.0,
        }
    }

    #[test]
    fn test_pointer_to_ndc() {
        let ndc = pointer_to_ndc(&PointerEvent { client_x: 0.0, client_y: 0.0 }, 200.0, 100.0);
        assert_abs_diff_eq!(ndc, Point2::new(-1.0, 1.0));

        let ndc = pointer_to_ndc(&PointerEvent { client_x: 150.0, client_y: 75.0 }, 200.0, 100.0);
        assert_abs_diff_eq!(ndc, Point2::new(0.5, -0.5));
    }

    #[test]
    fn test_pick_recolors_only_hit_triangle() {
        let mut scene = Scene::default();
        let geometry = scene.add_geometry(two_triangles());
        let mesh = scene.add_mesh("mesh", geometry, phong(true), None).unwrap();
        scene
            .geometry_mut(geometry)
            .and_then(|g| g.colors_mut())
            .unwrap()
            .clear_needs_update();

        let mut context = PickContext::new(PICK);
        let outcome = context
            .on_pointer_down(&center(), 100.0, 100.0, &camera(), &mut scene)
            .unwrap();

        let face = scene.geometry(geometry).unwrap().face(0).unwrap();
        assert_eq!(outcome, PickOutcome::Recolored { object: mesh, face });

        let colors = scene.geometry(geometry).unwrap().colors().unwrap();
        assert!(colors.needs_update());
        assert_eq!(&colors.as_slice()[0..3], &[PICK; 3]);
        assert_eq!(&colors.as_slice()[3..6], &[Color::WHITE; 3]);
    }

    #[test]
    fn test_click_on_empty_space_changes_nothing() {
        let mut scene = Scene::default();
        let geometry = scene.add_geometry(two_triangles());
        scene.add_mesh("mesh", geometry, phong(true), None);
        scene
            .geometry_mut(geometry)
            .and_then(|g| g.colors_mut())
            .unwrap()
            .clear_needs_update();

        let mut context = PickContext::new(PICK);
        let corner = PointerEvent {
            client_x: 0.0,
            client_y: 0.0,
        };
        let outcome = context
            .on_pointer_down(&corner, 100.0, 100.0, &camera(), &mut scene)
            .unwrap();

        assert_eq!(outcome, PickOutcome::Missed);
        let colors = scene.geometry(geometry).unwrap().colors().unwrap();
        assert!(!colors.needs_update());
        assert!(colors.as_slice().iter().all(|c| *c == Color::WHITE));
    }

    #[test]
    fn test_wireframe_only_hit_is_skipped() {
        let mut scene = Scene::default();
        let geometry = scene.add_geometry(two_triangles());
        let wire = scene.add_mesh("wireframe", geometry, wireframe(), None).unwrap();

        let mut context = PickContext::new(PICK);
        let outcome = context
            .on_pointer_down(&center(), 100.0, 100.0, &camera(), &mut scene)
            .unwrap();

        assert_eq!(outcome, PickOutcome::Skipped(PickError::NoColorAttribute(wire)));
        let colors = scene.geometry(geometry).unwrap().colors().unwrap();
        assert!(colors.as_slice().iter().all(|c| *c == Color::WHITE));
    }

    #[test]
    fn test_mesh_without_colors_is_skipped() {
        let mut scene = Scene::default();
        let mut plain = MeshGeometry::new();
        plain.push_triangle(Triangle::new(
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ));
        let geometry = scene.add_geometry(plain);
        let mesh = scene.add_mesh("mesh", geometry, phong(true), None).unwrap();

        let mut context = PickContext::new(PICK);
        let outcome = context
            .on_pointer_down(&center(), 100.0, 100.0, &camera(), &mut scene)
            .unwrap();
        assert_eq!(outcome, PickOutcome::Skipped(PickError::NoColorAttribute(mesh)));
    }

    #[test]
    fn test_mesh_with_overlay_picks_through_parent() {
        let mut scene = Scene::default();
        let geometry = scene.add_geometry(two_triangles());
        let mesh = scene.add_mesh("mesh", geometry, phong(true), None).unwrap();
        scene.add_mesh("wireframe", geometry, wireframe(), Some(mesh));

        let mut context = PickContext::new(PICK);
        let outcome = context
            .on_pointer_down(&center(), 100.0, 100.0, &camera(), &mut scene)
            .unwrap();
        assert!(matches!(outcome, PickOutcome::Recolored { object, .. } if object == mesh));
    }

    #[test]
    fn test_resolve_target_errors() {
        let mut scene = Scene::default();
        let geometry = scene.add_geometry(two_triangles());
        let mesh = scene.add_mesh("mesh", geometry, phong(true), None).unwrap();

        let mut hit = Intersection {
            distance: 1.0,
            point: Point3::origin(),
            face: None,
            object: mesh,
        };
        assert_eq!(resolve_target(&scene, &hit), Err(PickError::MissingFace));

        hit.face = Some(Face {
            a: 9,
            b: 10,
            c: 11,
            index: 3,
        });
        assert_eq!(
            resolve_target(&scene, &hit),
            Err(PickError::FaceOutOfRange {
                face: 3,
                vertices: 6
            })
        );

        let mut other = Scene::default();
        let unknown = other.add_geometry(two_triangles());
        other.add_mesh("a", unknown, phong(true), None);
        let stray = other.add_mesh("b", unknown, phong(true), None).unwrap();
        hit.object = stray;
        hit.face = scene.geometry(geometry).unwrap().face(0);
        assert_eq!(
            resolve_target(&scene, &hit),
            Err(PickError::UnknownObject(stray))
        );
    }

    #[test]
    fn test_pointer_state_is_reused() {
        let mut scene = Scene::default();
        let mut context = PickContext::new(PICK);
        let event = PointerEvent {
            client_x: 75.0,
            client_y: 25.0,
        };
        context
            .on_pointer_down(&event, 100.0, 100.0, &camera(), &mut scene)
            .unwrap();
        assert_abs_diff_eq!(context.pointer, Point2::new(0.5, 0.5));
    }
}
