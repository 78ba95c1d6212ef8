/// PickView Core Library - Scene model, picking and frame loop
///
/// This library holds everything that does not depend on a display:
/// mesh loading, camera and orbit math, ray casting, lighting, the scene
/// graph, the pick-and-recolor handler and the resize-aware frame loop.

pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod lighting;
pub mod loader;
pub mod obj;
pub mod orbit;
pub mod picking;
pub mod projection;
pub mod ray;
pub mod scene;
pub mod stl;
pub mod viewer;

// Re-export commonly used types
pub use color::Color;
pub use config::ViewerConfig;
pub use error::{PickError, ViewerError, ViewerResult};
pub use frame::{CancellationToken, FrameLoop, FrameStatus, RenderSurface};
pub use geometry::{Face, MeshGeometry, Triangle};
pub use loader::{load_mesh, parse_mesh, MeshFormat};
pub use orbit::OrbitControls;
pub use picking::{PickContext, PickOutcome, PointerEvent};
pub use projection::PerspectiveCamera;
pub use scene::{Material, ObjectId, Scene};
pub use viewer::Viewer;
