/// Triangle geometry with per-vertex attribute buffers
use nalgebra::{Point3, Vector3};

use crate::color::Color;

/// A triangle given by three positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Point3<f32>; 3],
}

impl Triangle {
    pub fn new(v0: Point3<f32>, v1: Point3<f32>, v2: Point3<f32>) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the face normal from the triangle's winding.
    ///
    /// Degenerate triangles yield a zero vector.
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let edge1 = self.vertices[1] - self.vertices[0];
        let edge2 = self.vertices[2] - self.vertices[0];

        edge1
            .cross(&edge2)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }
}

/// Vertex indices of one triangle in a geometry's buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub index: usize,
}

impl Face {
    pub fn vertices(&self) -> [usize; 3] {
        [self.a, self.b, self.c]
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl BoundingBox {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f32>>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for p in iter {
            bounds.min = bounds.min.inf(p);
            bounds.max = bounds.max.sup(p);
        }
        Some(bounds)
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }
}

/// Per-vertex colors plus the bookkeeping a renderer needs to re-upload them
#[derive(Debug, Clone)]
pub struct ColorAttribute {
    data: Vec<Color>,
    version: u32,
    needs_update: bool,
}

impl ColorAttribute {
    fn filled(count: usize, color: Color) -> Self {
        Self {
            data: vec![color; count],
            version: 0,
            needs_update: true,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Color> {
        self.data.get(index).copied()
    }

    pub fn as_slice(&self) -> &[Color] {
        &self.data
    }

    /// Overwrite one vertex color in place. Returns false if out of range.
    pub fn set(&mut self, index: usize, color: Color) -> bool {
        match self.data.get_mut(index) {
            Some(slot) => {
                *slot = color;
                true
            }
            None => false,
        }
    }

    /// Flag the buffer as dirty so renderers upload it again.
    pub fn mark_needs_update(&mut self) {
        self.version = self.version.wrapping_add(1);
        self.needs_update = true;
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Called by a renderer after it has uploaded the current contents.
    pub fn clear_needs_update(&mut self) {
        self.needs_update = false;
    }
}

/// Non-indexed triangle soup: every three consecutive vertices form a triangle.
#[derive(Debug, Clone, Default)]
pub struct MeshGeometry {
    positions: Vec<Point3<f32>>,
    normals: Vec<Vector3<f32>>,
    colors: Option<ColorAttribute>,
    bounds: Option<BoundingBox>,
}

impl MeshGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(triangles: usize) -> Self {
        Self {
            positions: Vec::with_capacity(triangles * 3),
            normals: Vec::with_capacity(triangles * 3),
            colors: None,
            bounds: None,
        }
    }

    /// Append a triangle with flat normals derived from its winding.
    pub fn push_triangle(&mut self, triangle: Triangle) {
        let normal = triangle.calculate_normal();
        self.push_triangle_with_normals(triangle, [normal; 3]);
    }

    pub fn push_triangle_with_normals(&mut self, triangle: Triangle, normals: [Vector3<f32>; 3]) {
        for (position, normal) in triangle.vertices.iter().zip(normals) {
            self.positions.push(*position);
            self.normals.push(normal);
            self.bounds = Some(match self.bounds {
                Some(b) => BoundingBox {
                    min: b.min.inf(position),
                    max: b.max.sup(position),
                },
                None => BoundingBox {
                    min: *position,
                    max: *position,
                },
            });
        }
        // Topology changed, so any existing color buffer no longer lines up
        if let Some(colors) = &mut self.colors {
            colors.data.resize(self.positions.len(), Color::WHITE);
            colors.mark_needs_update();
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn positions(&self) -> &[Point3<f32>] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vector3<f32>] {
        &self.normals
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounds
    }

    pub fn face(&self, index: usize) -> Option<Face> {
        if index < self.triangle_count() {
            let a = index * 3;
            Some(Face {
                a,
                b: a + 1,
                c: a + 2,
                index,
            })
        } else {
            None
        }
    }

    pub fn triangle(&self, index: usize) -> Option<Triangle> {
        let face = self.face(index)?;
        Some(Triangle::new(
            self.positions[face.a],
            self.positions[face.b],
            self.positions[face.c],
        ))
    }

    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.positions
            .chunks_exact(3)
            .map(|v| Triangle::new(v[0], v[1], v[2]))
    }

    /// Create the per-vertex color attribute filled with one color.
    ///
    /// An existing attribute is overwritten in place rather than replaced.
    pub fn set_color_attribute(&mut self, fill: Color) {
        let count = self.positions.len();
        match &mut self.colors {
            Some(colors) => {
                colors.data.iter_mut().for_each(|c| *c = fill);
                colors.mark_needs_update();
            }
            None => self.colors = Some(ColorAttribute::filled(count, fill)),
        }
    }

    pub fn colors(&self) -> Option<&ColorAttribute> {
        self.colors.as_ref()
    }

    pub fn colors_mut(&mut self) -> Option<&mut ColorAttribute> {
        self.colors.as_mut()
    }

    /// Create a cube centered at the origin, wound counter-clockwise from outside
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let p = Point3::new;
        let mut geometry = Self::with_capacity(12);

        let quads = [
            // Front (+z)
            [p(-h, -h, h), p(h, -h, h), p(h, h, h), p(-h, h, h)],
            // Back (-z)
            [p(h, -h, -h), p(-h, -h, -h), p(-h, h, -h), p(h, h, -h)],
            // Top (+y)
            [p(-h, h, h), p(h, h, h), p(h, h, -h), p(-h, h, -h)],
            // Bottom (-y)
            [p(-h, -h, -h), p(h, -h, -h), p(h, -h, h), p(-h, -h, h)],
            // Right (+x)
            [p(h, -h, h), p(h, -h, -h), p(h, h, -h), p(h, h, h)],
            // Left (-x)
            [p(-h, -h, -h), p(-h, -h, h), p(-h, h, h), p(-h, h, -h)],
        ];

        for [a, b, c, d] in quads {
            geometry.push_triangle(Triangle::new(a, b, c));
            geometry.push_triangle(Triangle::new(a, c, d));
        }

        geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_normals_point_outward() {
        let cube = MeshGeometry::cube(2.0);
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.vertex_count(), 36);

        let center = Point3::origin();
        for triangle in cube.triangles() {
            let centroid = nalgebra::center(
                &nalgebra::center(&triangle.vertices[0], &triangle.vertices[1]),
                &triangle.vertices[2],
            );
            assert!(triangle.calculate_normal().dot(&(centroid - center)) > 0.0);
        }
    }

    #[test]
    fn test_faces_are_consecutive_vertices() {
        let cube = MeshGeometry::cube(1.0);
        let face = cube.face(4).unwrap();
        assert_eq!(face.vertices(), [12, 13, 14]);
        assert!(cube.face(12).is_none());
    }

    #[test]
    fn test_color_attribute_matches_positions() {
        let mut cube = MeshGeometry::cube(1.0);
        assert!(cube.colors().is_none());

        cube.set_color_attribute(Color::WHITE);
        assert_eq!(cube.colors().unwrap().len(), cube.vertex_count());

        cube.push_triangle(Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ));
        assert_eq!(cube.colors().unwrap().len(), cube.vertex_count());
    }

    #[test]
    fn test_color_writes_bump_version() {
        let mut cube = MeshGeometry::cube(1.0);
        cube.set_color_attribute(Color::WHITE);
        let colors = cube.colors_mut().unwrap();
        colors.clear_needs_update();
        let before = colors.version();

        assert!(colors.set(0, Color::BLACK));
        assert!(!colors.set(1000, Color::BLACK));
        colors.mark_needs_update();

        assert!(colors.needs_update());
        assert_eq!(colors.version(), before + 1);
        assert_eq!(colors.get(0), Some(Color::BLACK));
    }

    #[test]
    fn test_bounding_box() {
        let cube = MeshGeometry::cube(2.0);
        let bounds = cube.bounding_box().unwrap();
        assert_eq!(bounds.min, Point3::new(-1.0, -1.0, -1.0));
        assert_eq!(bounds.max, Point3::new(1.0, 1.0, 1.0));
        assert_eq!(bounds.center(), Point3::origin());
    }
}
