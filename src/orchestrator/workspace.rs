/**
 * Request Workspace
 */

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};
use uuid::Uuid;

/// Request-scoped scratch directory `<root>/<uuid>`.
///
/// Call [`Workspace::release`] on every path. If the owning task unwinds
/// first, `Drop` removes the directory synchronously.
#[derive(Debug)]
pub struct Workspace {
    id: Uuid,
    path: PathBuf,
    released: bool,
}

impl Workspace {
    pub async fn allocate(root: &Path) -> io::Result<Self> {
        tokio::fs::create_dir_all(root).await?;
        let id = Uuid::new_v4();
        let path = root.join(id.to_string());
        // create_dir, not create_dir_all: an existing directory is a collision.
        tokio::fs::create_dir(&path).await?;
        debug!(workspace = %path.display(), "workspace allocated");
        Ok(Self {
            id,
            path,
            released: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Recursive, forced removal. Failures are logged and swallowed.
    pub async fn release(mut self) {
        self.released = true;
        info!(workspace = %self.path.display(), "cleaning up temporary directory");
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => error!(
                workspace = %self.path.display(),
                error = %e,
                "failed to remove temporary directory"
            ),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => info!(workspace = %self.path.display(), "workspace removed on unwind"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => error!(
                workspace = %self.path.display(),
                error = %e,
                "failed to remove temporary directory"
            ),
        }
    }
}
