use std::future::Future;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::DownloadRequest;
use crate::services::api::BookApiClient;

/// Receives the finished book once a job completes.
pub trait DownloadHandler {
    /// Deliver the document described by `request`, returning where it ended up.
    fn handle(&self, request: &DownloadRequest) -> impl Future<Output = Result<PathBuf>> + Send;
}

/// Fetches completed books and writes them into a local directory.
pub struct FileDownloader {
    api: BookApiClient,
    output_dir: PathBuf,
}

impl FileDownloader {
    pub fn new(api: BookApiClient, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            api,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl DownloadHandler for FileDownloader {
    async fn handle(&self, request: &DownloadRequest) -> Result<PathBuf> {
        let bytes = self.api.download(&request.job_id).await?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(&request.filename);
        tokio::fs::write(&path, &bytes).await?;

        tracing::info!(
            job_id = %request.job_id,
            path = %path.display(),
            bytes = bytes.len(),
            "book downloaded"
        );
        Ok(path)
    }
}
