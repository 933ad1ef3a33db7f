//! On-disk layout under the configured storage path.
//!
//! ```text
//! <root>/
//!   tmp/                  private temp files and directories
//!   cache/<sha256>        immutable downloaded artifacts
//!   instances/<id>/       working directory of a live instance
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{RemoteError, RemoteResult};

#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    /// The root is made absolute so that paths handed to child processes stay
    /// valid regardless of their working directory.
    pub fn new(root: impl AsRef<Path>) -> RemoteResult<Self> {
        let root = std::path::absolute(root.as_ref())
            .map_err(|e| RemoteError::storage("failed to resolve storage path", e))?;
        Ok(Self { root })
    }

    /// Create `tmp/`, `cache/` and `instances/`.
    pub fn initialize(&self) -> RemoteResult<()> {
        for dir in [self.tmp_dir(), self.cache_dir(), self.instances_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                RemoteError::storage(&format!("failed to create {}", dir.display()), e)
            })?;
        }
        debug!(root = %self.root.display(), "storage initialized");
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    pub fn instances_dir(&self) -> PathBuf {
        self.root.join("instances")
    }

    /// Working directory for one instance.
    ///
    /// Rejects ids that would escape `instances/`.
    pub fn instance_dir(&self, instance_id: &str) -> RemoteResult<PathBuf> {
        let valid = !instance_id.is_empty()
            && instance_id != "."
            && instance_id != ".."
            && !instance_id.contains(['/', '\\', '\0']);
        if !valid {
            return Err(RemoteError::Storage {
                message: format!("invalid instance id: {instance_id:?}"),
            });
        }
        Ok(self.instances_dir().join(instance_id))
    }

    /// Fresh private directory under `tmp/`, removed when dropped.
    pub fn temp_dir(&self, prefix: &str) -> RemoteResult<tempfile::TempDir> {
        tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(self.tmp_dir())
            .map_err(|e| RemoteError::storage("failed to create temp dir", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_creates_layout() {
        let root = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(root.path()).unwrap();
        layout.initialize().unwrap();

        assert!(layout.tmp_dir().is_dir());
        assert!(layout.cache_dir().is_dir());
        assert!(layout.instances_dir().is_dir());
    }

    #[test]
    fn instance_dir_rejects_traversal() {
        let root = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(root.path()).unwrap();

        assert!(layout.instance_dir("..").is_err());
        assert!(layout.instance_dir("a/b").is_err());
        assert!(layout.instance_dir("").is_err());
        assert_eq!(
            layout.instance_dir("abc").unwrap(),
            layout.instances_dir().join("abc")
        );
    }

    #[test]
    fn temp_dir_lives_under_tmp_and_is_removed() {
        let root = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(root.path()).unwrap();
        layout.initialize().unwrap();

        let dir = layout.temp_dir("judge-").unwrap();
        let path = dir.path().to_path_buf();
        assert!(path.starts_with(layout.tmp_dir()));
        drop(dir);
        assert!(!path.exists());
    }
}
