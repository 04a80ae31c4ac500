use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use super::{BackendError, EntryKind, RemoteEntry, StorageBackend};

/// Filesystem stand-in for the remote backend. The "cloud" is a second local
/// directory, which gives the same operation contract without any network
/// dependency.
pub struct LocalMirrorBackend {
    root: PathBuf,
}

impl LocalMirrorBackend {
    /// The mirror root is `{root_base}/{folder}`, created if absent.
    pub async fn new(root_base: impl AsRef<Path>, folder: &str) -> io::Result<Self> {
        let root = root_base.as_ref().join(folder);
        tokio::fs::create_dir_all(&root).await?;
        info!(root = %root.display(), "local mirror backend initialized");
        Ok(Self { root })
    }

    #[allow(dead_code)]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl StorageBackend for LocalMirrorBackend {
    async fn upload(&self, local_path: &Path, remote_name: &str) -> Result<(), BackendError> {
        tokio::fs::copy(local_path, self.root.join(remote_name)).await?;
        Ok(())
    }

    async fn overwrite(&self, local_path: &Path, remote_name: &str) -> Result<(), BackendError> {
        tokio::fs::copy(local_path, self.root.join(remote_name)).await?;
        Ok(())
    }

    async fn delete(&self, remote_name: &str) -> Result<(), BackendError> {
        match tokio::fs::remove_file(self.root.join(remote_name)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn list(&self) -> Result<Vec<RemoteEntry>, BackendError> {
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            entries.push(RemoteEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind: EntryKind::File,
            });
        }
        Ok(entries)
    }
}
