use std::io;
use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{MirrorConfig, ProviderKind};
use crate::transfer::TransferError;

mod local_mirror;
mod yandex;

pub use local_mirror::LocalMirrorBackend;
pub use yandex::YandexBackend;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("api error: {0}")]
    Api(#[from] diskmirror_core::DiskError),
    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// A storage destination exposing the four primitive mirror operations.
///
/// Every recoverable condition (network failure, unreadable local file, API
/// error status) is returned as an `Err` value rather than panicking, so one
/// failed file never takes down the cycle that issued it.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Creates a new remote object. Must not replace an existing one where
    /// the backend can express that distinction.
    async fn upload(&self, local_path: &Path, remote_name: &str) -> Result<(), BackendError>;

    /// Creates or replaces the remote object unconditionally.
    async fn overwrite(&self, local_path: &Path, remote_name: &str) -> Result<(), BackendError>;

    /// Removes the remote object. Deleting an already-absent object is a
    /// success.
    async fn delete(&self, remote_name: &str) -> Result<(), BackendError>;

    /// Lists the entries at the backend's configured root.
    async fn list(&self) -> Result<Vec<RemoteEntry>, BackendError>;
}

/// Builds the backend selected by the configuration.
pub async fn create_backend(config: &MirrorConfig) -> anyhow::Result<Box<dyn StorageBackend>> {
    match config.provider {
        ProviderKind::Yandex => Ok(Box::new(YandexBackend::new(
            &config.access_token,
            &config.cloud_folder,
        )?)),
        ProviderKind::LocalMock => Ok(Box::new(
            LocalMirrorBackend::new(&config.access_token, &config.cloud_folder).await?,
        )),
    }
}
