//! Scene graph: lights, a geometry arena and a tree of mesh objects.
//!
//! Objects refer to geometry by `GeometryId`, so the shaded mesh and its
//! wireframe overlay can share one buffer set without shared ownership.

use nalgebra::Point3;

use crate::color::Color;
use crate::geometry::{Face, MeshGeometry};
use crate::lighting::Light;
use crate::ray::Raycaster;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

/// Which triangle sides are drawn and hit by rays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhongMaterial {
    pub color: Color,
    pub flat_shading: bool,
    pub vertex_colors: bool,
    pub shininess: f32,
    pub side: Side,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireframeMaterial {
    pub color: Color,
    pub opacity: f32,
    pub transparent: bool,
    pub side: Side,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    Phong(PhongMaterial),
    Wireframe(WireframeMaterial),
}

impl Material {
    /// Whether this material reads the geometry's per-vertex color attribute
    pub fn uses_vertex_colors(&self) -> bool {
        match self {
            Material::Phong(phong) => phong.vertex_colors,
            Material::Wireframe(_) => false,
        }
    }

    pub fn side(&self) -> Side {
        match self {
            Material::Phong(phong) => phong.side,
            Material::Wireframe(wire) => wire.side,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub geometry: GeometryId,
    pub material: Material,
    pub parent: Option<ObjectId>,
    pub children: Vec<ObjectId>,
}

/// One ray hit, as returned by `Scene::intersect`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub distance: f32,
    pub point: Point3<f32>,
    pub face: Option<Face>,
    pub object: ObjectId,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub background: Color,
    pub lights: Vec<Light>,
    geometries: Vec<MeshGeometry>,
    objects: Vec<SceneObject>,
    roots: Vec<ObjectId>,
}

impl Scene {
    pub fn new(background: Color) -> Self {
        Self {
            background,
            lights: Vec::new(),
            geometries: Vec::new(),
            objects: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn add_geometry(&mut self, geometry: MeshGeometry) -> GeometryId {
        self.geometries.push(geometry);
        GeometryId(self.geometries.len() - 1)
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&MeshGeometry> {
        self.geometries.get(id.0)
    }

    pub fn geometry_mut(&mut self, id: GeometryId) -> Option<&mut MeshGeometry> {
        self.geometries.get_mut(id.0)
    }

    pub fn geometries_mut(&mut self) -> impl Iterator<Item = &mut MeshGeometry> {
        self.geometries.iter_mut()
    }

    /// Add a mesh object, either at the root or under `parent`.
    ///
    /// Returns `None` if the geometry or parent does not exist.
    pub fn add_mesh(
        &mut self,
        name: impl Into<String>,
        geometry: GeometryId,
        material: Material,
        parent: Option<ObjectId>,
    ) -> Option<ObjectId> {
        self.geometry(geometry)?;
        if let Some(parent) = parent {
            self.object(parent)?;
        }

        let id = ObjectId(self.objects.len());
        self.objects.push(SceneObject {
            name: name.into(),
            geometry,
            material,
            parent,
            children: Vec::new(),
        });

        match parent {
            Some(parent) => self.objects[parent.0].children.push(id),
            None => self.roots.push(id),
        }

        Some(id)
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(id.0)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Objects in depth-first order, each parent before its children
    pub fn traverse(&self) -> Vec<ObjectId> {
        let mut order = Vec::with_capacity(self.objects.len());
        let mut stack: Vec<ObjectId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.objects[id.0].children.iter().rev().copied());
        }
        order
    }

    /// All hits along the raycaster's ray, nearest first.
    ///
    /// The sort is stable, so at equal distance a parent precedes its children.
    pub fn intersect(&self, raycaster: &Raycaster) -> Vec<Intersection> {
        let mut hits = Vec::new();
        for id in self.traverse() {
            self.intersect_object(id, raycaster, &mut hits);
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn intersect_object(&self, id: ObjectId, raycaster: &Raycaster, hits: &mut Vec<Intersection>) {
        let object = &self.objects[id.0];
        let Some(geometry) = self.geometry(object.geometry) else {
            return;
        };
        let ray = &raycaster.ray;

        match geometry.bounding_box() {
            Some(bounds) if ray.intersects_aabb(&bounds).is_some() => {}
            _ => return,
        }

        let cull = object.material.side() == Side::Front;
        for (index, triangle) in geometry.triangles().enumerate() {
            let Some(distance) = ray.intersect_triangle(&triangle, cull) else {
                continue;
            };
            if !raycaster.accepts(distance) {
                continue;
            }
            hits.push(Intersection {
                distance,
                point: ray.at(distance),
                face: geometry.face(index),
                object: id,
            });
        }
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Color::BLACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Triangle;
    use crate::ray::Ray;
    use nalgebra::Vector3;

    fn phong() -> Material {
        Material::Phong(PhongMaterial {
            color: Color::WHITE,
            flat_shading: true,
            vertex_colors: true,
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

    fn raycaster_along(origin: Point3<f32>, direction: Vector3<f32>) -> Raycaster {
        let mut raycaster = Raycaster::new();
        raycaster.ray = Ray::new(origin, direction);
        raycaster
    }

    #[test]
    fn test_add_mesh_validates_ids() {
        let mut scene = Scene::default();
        let geometry = scene.add_geometry(MeshGeometry::cube(1.0));
        let mesh = scene.add_mesh("mesh", geometry, phong(), None).unwrap();
        assert!(scene.add_mesh("orphan", GeometryId(7), phong(), None).is_none());
        assert!(scene
            .add_mesh("child", geometry, wireframe(), Some(ObjectId(9)))
            .is_none());

        let child = scene
            .add_mesh("wireframe", geometry, wireframe(), Some(mesh))
            .unwrap();
        assert_eq!(scene.object(mesh).unwrap().children, vec![child]);
        assert_eq!(scene.traverse(), vec![mesh, child]);
    }

    #[test]
    fn test_intersections_sorted_nearest_first() {
        let mut scene = Scene::default();
        let mut layers = MeshGeometry::new();
        for z in [-1.0, 1.0, 0.0] {
            layers.push_triangle(Triangle::new(
                Point3::new(-1.0, -1.0, z),
                Point3::new(1.0, -1.0, z),
                Point3::new(0.0, 1.0, z),
            ));
        }
        let geometry = scene.add_geometry(layers);
        scene.add_mesh("layers", geometry, phong(), None);

        let hits = scene.intersect(&raycaster_along(Point3::new(0.0, 0.0, 5.0), -Vector3::z()));
        let faces: Vec<usize> = hits.iter().map(|h| h.face.unwrap().index).collect();
        assert_eq!(faces, vec![1, 2, 0]);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_parent_precedes_child_at_equal_distance() {
        let mut scene = Scene::default();
        let geometry = scene.add_geometry(MeshGeometry::cube(2.0));
        let mesh = scene.add_mesh("mesh", geometry, phong(), None).unwrap();
        let wire = scene
            .add_mesh("wireframe", geometry, wireframe(), Some(mesh))
            .unwrap();

        let hits = scene.intersect(&raycaster_along(Point3::new(0.1, 0.2, 5.0), -Vector3::z()));
        // Back faces of the cube are culled, so one hit per object
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].object, mesh);
        assert_eq!(hits[1].object, wire);
        assert_eq!(hits[0].distance, hits[1].distance);
    }

    #[test]
    fn test_far_limit_and_miss() {
        let mut scene = Scene::default();
        let geometry = scene.add_geometry(MeshGeometry::cube(2.0));
        scene.add_mesh("mesh", geometry, phong(), None);

        let mut raycaster = raycaster_along(Point3::new(0.0, 0.0, 5.0), -Vector3::z());
        raycaster.far = 3.0;
        assert!(scene.intersect(&raycaster).is_empty());

        let miss = raycaster_along(Point3::new(5.0, 5.0, 5.0), Vector3::z());
        assert!(scene.intersect(&miss).is_empty());
    }
}
