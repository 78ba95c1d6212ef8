/// Background mesh loading for the terminal frontend
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use std::thread;

use pickview_core::{load_mesh, MeshGeometry, ViewerError, ViewerResult};

/// A mesh load running on its own thread.
///
/// The result is delivered exactly once through `poll`.
pub struct AssetLoad {
    receiver: Option<Receiver<ViewerResult<MeshGeometry>>>,
}

impl AssetLoad {
    pub fn spawn(path: impl Into<String>) -> Self {
        let path = path.into();
        let (sender, receiver) = bounded(1);

        let worker = sender.clone();
        let spawned = thread::Builder::new()
            .name("asset-loader".to_string())
            .spawn(move || {
                log::debug!("loading '{}'", path);
                let _ = worker.send(load_mesh(&path));
            });

        if let Err(e) = spawned {
            let _ = sender.send(Err(ViewerError::Io(e)));
        }

        Self {
            receiver: Some(receiver),
        }
    }

    /// A load that has already finished, used for in-memory meshes.
    pub fn ready(result: ViewerResult<MeshGeometry>) -> Self {
        let (sender, receiver) = bounded(1);
        let _ = sender.send(result);
        Self {
            receiver: Some(receiver),
        }
    }

    /// Take the result if the load has finished.
    pub fn poll(&mut self) -> Option<ViewerResult<MeshGeometry>> {
        let receiver = self.receiver.as_ref()?;
        match receiver.try_recv() {
            Ok(result) => {
                self.receiver = None;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.receiver = None;
                Some(Err(ViewerError::MeshParse(
                    "asset loader exited without a result".to_string(),
                )))
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.receiver.is_some()
    }
}
