use std::path::Path;
use std::sync::Arc;

use tokio::fs;
use tracing::{info, instrument, warn};

use super::extractor::{Extractor, ExtractorError, FetchOptions};
use super::{Platform, access_url, artifact_name_now};
use crate::store::Store;

/// Extensions yt-dlp uses for in-progress files next to the target
const PARTIAL_SUFFIXES: &[&str] = &["part", "ytdl"];

/// A request to download one video
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
}

/// Outcome of a successful job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub filename: String,
    pub access_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("URL cannot be empty")]
    Validation,
    #[error(transparent)]
    Extraction(#[from] ExtractorError),
    #[error("Downloaded file not found")]
    Verification,
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

/// Turns a download request into exactly one file in the store
#[derive(Clone)]
pub struct JobRunner {
    store: Store,
    extractor: Arc<dyn Extractor>,
    options: FetchOptions,
}

impl JobRunner {
    pub fn new(store: Store, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            store,
            extractor,
            options: FetchOptions::default(),
        }
    }

    /// Runs one download job to completion.
    ///
    /// Nothing is left in the store when this returns an error.
    #[instrument(skip(self, request), fields(url = %request.url))]
    pub async fn submit(&self, request: DownloadRequest) -> Result<DownloadedFile, JobError> {
        let url = request.url.trim();
        if url.is_empty() {
            return Err(JobError::Validation);
        }

        let platform = Platform::from_url(url);
        let filename = artifact_name_now(platform);
        let target = self.store.path_for(&filename);

        if let Err(e) = self.fetch_and_verify(url, &target).await {
            warn!(%filename, "download failed: {}", e);
            remove_leftovers(&target).await;
            return Err(e);
        }

        info!(%filename, %platform, "download finished");
        Ok(DownloadedFile {
            access_url: access_url(&filename),
            filename,
        })
    }

    async fn fetch_and_verify(&self, url: &str, target: &Path) -> Result<(), JobError> {
        self.extractor.fetch(url, target, &self.options).await?;

        match fs::metadata(target).await {
            Ok(metadata) if metadata.is_file() => Ok(()),
            Ok(_) => Err(JobError::Verification),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(JobError::Verification),
            Err(e) => Err(e.into()),
        }
    }
}

/// Removes the target and any partial files the extractor left behind
async fn remove_leftovers(target: &Path) {
    let mut candidates = vec![target.to_path_buf()];
    for suffix in PARTIAL_SUFFIXES {
        let mut name = target.as_os_str().to_owned();
        name.push(".");
        name.push(suffix);
        candidates.push(name.into());
    }

    for path in candidates {
        match fs::remove_file(&path).await {
            Ok(()) => info!("removed leftover {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("could not remove leftover {}: {}", path.display(), e),
        }
    }
}
