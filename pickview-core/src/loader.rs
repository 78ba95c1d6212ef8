/// Mesh asset loading by file extension
use std::fs;
use std::path::Path;

use crate::error::{ViewerError, ViewerResult};
use crate::geometry::MeshGeometry;
use crate::{obj, stl};

/// Mesh file formats the viewer can read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Obj,
    Stl,
}

impl MeshFormat {
    /// Pick the format from a path or URL's extension.
    pub fn from_path(path: &str) -> ViewerResult<Self> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("obj") => Ok(MeshFormat::Obj),
            Some("stl") => Ok(MeshFormat::Stl),
            _ => Err(ViewerError::UnsupportedFormat(path.to_string())),
        }
    }
}

/// Parse mesh bytes that have already been fetched.
pub fn parse_mesh(data: &[u8], format: MeshFormat) -> ViewerResult<MeshGeometry> {
    let geometry = match format {
        MeshFormat::Obj => obj::parse_obj_bytes(data)?,
        MeshFormat::Stl => stl::parse_stl(data)?,
    };

    if geometry.triangle_count() == 0 {
        return Err(ViewerError::EmptyMesh);
    }

    Ok(geometry)
}

/// Read and parse a mesh file from disk.
pub fn load_mesh(path: impl AsRef<Path>) -> ViewerResult<MeshGeometry> {
    let path = path.as_ref();
    let format = MeshFormat::from_path(&path.to_string_lossy())?;
    let data = fs::read(path)?;
    parse_mesh(&data, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(MeshFormat::from_path("public/monkey.obj").unwrap(), MeshFormat::Obj);
        assert_eq!(MeshFormat::from_path("part.STL").unwrap(), MeshFormat::Stl);
        assert!(matches!(
            MeshFormat::from_path("scene.gltf"),
            Err(ViewerError::UnsupportedFormat(_))
        ));
        assert!(MeshFormat::from_path("no_extension").is_err());
    }

    #[test]
    fn test_empty_mesh_is_rejected() {
        let result = parse_mesh(b"# nothing here\n", MeshFormat::Obj);
        assert!(matches!(result, Err(ViewerError::EmptyMesh)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_mesh("does/not/exist.obj");
        assert!(matches!(result, Err(ViewerError::Io(_))));
    }
}
