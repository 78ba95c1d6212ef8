//! Wavefront OBJ loading.
//!
//! Every model in the file is triangulated and expanded into one non-indexed
//! geometry, so each triangle owns its three vertices. Material libraries are
//! ignored; the viewer assigns its own materials.

use std::io::BufRead;

use nalgebra::{Point3, Vector3};

use crate::error::{ViewerError, ViewerResult};
use crate::geometry::{MeshGeometry, Triangle};

/// Parse OBJ text from any buffered reader.
pub fn parse_obj<R: BufRead>(reader: &mut R) -> ViewerResult<MeshGeometry> {
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };

    let (models, _materials) = tobj::load_obj_buf(reader, &options, |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })
    .map_err(|e| ViewerError::MeshParse(format!("invalid OBJ: {}", e)))?;

    let triangles: usize = models.iter().map(|m| m.mesh.indices.len() / 3).sum();
    let mut geometry = MeshGeometry::with_capacity(triangles);

    for model in &models {
        let mesh = &model.mesh;
        let position = |i: u32| {
            let i = i as usize * 3;
            mesh.positions
                .get(i..i + 3)
                .map(|p| Point3::new(p[0], p[1], p[2]))
        };
        let normal = |i: u32| {
            let i = i as usize * 3;
            mesh.normals
                .get(i..i + 3)
                .map(|n| Vector3::new(n[0], n[1], n[2]))
        };

        for face in mesh.indices.chunks_exact(3) {
            let (Some(a), Some(b), Some(c)) = (position(face[0]), position(face[1]), position(face[2]))
            else {
                return Err(ViewerError::MeshParse(format!(
                    "model '{}' references a missing vertex",
                    model.name
                )));
            };
            let triangle = Triangle::new(a, b, c);

            match (normal(face[0]), normal(face[1]), normal(face[2])) {
                (Some(na), Some(nb), Some(nc)) => {
                    geometry.push_triangle_with_normals(triangle, [na, nb, nc])
                }
                _ => geometry.push_triangle(triangle),
            }
        }
    }

    log::debug!(
        "parsed OBJ: {} models, {} triangles",
        models.len(),
        geometry.triangle_count()
    );

    Ok(geometry)
}

/// Parse OBJ data held in memory.
pub fn parse_obj_bytes(data: &[u8]) -> ViewerResult<MeshGeometry> {
    let mut reader = data;
    parse_obj(&mut reader)
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD: &str = "
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";

    #[test]
    fn test_quad_is_triangulated_and_expanded() {
        let geometry = parse_obj_bytes(QUAD.as_bytes()).unwrap();
        assert_eq!(geometry.triangle_count(), 2);
        assert_eq!(geometry.vertex_count(), 6);
        // No normals in the file, so flat normals follow the winding
        assert_eq!(geometry.normals()[0], Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_file_normals_are_kept() {
        let text = "
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 -1
f 1//1 2//1 3//1
";
        let geometry = parse_obj_bytes(text.as_bytes()).unwrap();
        assert_eq!(geometry.triangle_count(), 1);
        assert_eq!(geometry.normals()[1], Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_models_are_concatenated() {
        let text = "
o first
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o second
v 0 0 1
v 1 0 1
v 0 1 1
f 4 5 6
";
        let geometry = parse_obj_bytes(text.as_bytes()).unwrap();
        assert_eq!(geometry.triangle_count(), 2);
        assert_eq!(geometry.positions()[3], Point3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_bad_index_is_an_error() {
        let text = "v 0 0 0\nf 1 2 3\n";
        assert!(parse_obj_bytes(text.as_bytes()).is_err());
    }
}
