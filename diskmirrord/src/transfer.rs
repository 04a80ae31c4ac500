use std::io;
use std::path::Path;

use diskmirror_core::is_success_status;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio_util::io::ReaderStream;
use url::Url;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("upload target returned {0}")]
    Status(StatusCode),
}

#[derive(Clone)]
pub struct TransferClient {
    http: Client,
}

impl TransferClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    /// Streams the file at `source` to a previously issued upload href.
    pub async fn upload_from_path(&self, href: &Url, source: &Path) -> Result<(), TransferError> {
        let file = tokio::fs::File::open(source).await?;
        let stream = ReaderStream::new(file);
        let body = reqwest::Body::wrap_stream(stream);
        let response = self.http.put(href.clone()).body(body).send().await?;
        if !is_success_status(response.status()) {
            return Err(TransferError::Status(response.status()));
        }
        Ok(())
    }
}

impl Default for TransferClient {
    fn default() -> Self {
        Self::new()
    }
}
