use std::path::Path;

use async_trait::async_trait;
use diskmirror_core::{DiskClient, DiskError, ResourceType};
use reqwest::StatusCode;

use super::{BackendError, EntryKind, RemoteEntry, StorageBackend};
use crate::transfer::TransferClient;

const LIST_PAGE_LIMIT: u32 = 1000;

/// Backend speaking the Yandex Disk REST API. Uploads are two-phase: the API
/// issues a one-shot href, then the file bytes are PUT to it.
pub struct YandexBackend {
    client: DiskClient,
    transfer: TransferClient,
    folder: String,
}

impl YandexBackend {
    pub fn new(token: &str, folder: &str) -> Result<Self, DiskError> {
        Ok(Self::with_client(DiskClient::new(token)?, folder))
    }

    pub fn with_client(client: DiskClient, folder: &str) -> Self {
        Self {
            client,
            transfer: TransferClient::new(),
            folder: folder.trim_end_matches('/').to_string(),
        }
    }

    fn remote_path(&self, name: &str) -> String {
        format!("{}/{}", self.folder, name)
    }

    async fn transfer_to_cloud(
        &self,
        local_path: &Path,
        remote_name: &str,
        overwrite: bool,
    ) -> Result<(), BackendError> {
        let link = self
            .client
            .get_upload_link(&self.remote_path(remote_name), overwrite)
            .await?;
        self.transfer.upload_from_path(&link.href, local_path).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for YandexBackend {
    async fn upload(&self, local_path: &Path, remote_name: &str) -> Result<(), BackendError> {
        self.transfer_to_cloud(local_path, remote_name, false).await
    }

    async fn overwrite(&self, local_path: &Path, remote_name: &str) -> Result<(), BackendError> {
        self.transfer_to_cloud(local_path, remote_name, true).await
    }

    async fn delete(&self, remote_name: &str) -> Result<(), BackendError> {
        match self
            .client
            .delete_resource(&self.remote_path(remote_name), true)
            .await
        {
            Ok(_) => Ok(()),
            // Already gone; the intent is satisfied.
            Err(err) if err.is_api_status(StatusCode::NOT_FOUND) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn list(&self) -> Result<Vec<RemoteEntry>, BackendError> {
        let list = self
            .client
            .list_directory(&self.folder, Some(LIST_PAGE_LIMIT))
            .await?;
        Ok(list
            .items
            .into_iter()
            .map(|item| RemoteEntry {
                name: item.name,
                kind: match item.resource_type {
                    ResourceType::File => EntryKind::File,
                    ResourceType::Dir => EntryKind::Dir,
                },
            })
            .collect())
    }
}
