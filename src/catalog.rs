use std::io;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;
use tokio_stream::{StreamExt, wrappers::ReadDirStream};
use tracing::{debug, info};

use crate::download::access_url;
use crate::store::{ARTIFACT_PREFIX, Store, is_safe_name};

/// A downloaded artifact as found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub name: String,
    #[serde(rename = "url")]
    pub access_url: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("File not found")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(#[from] io::Error),
}

/// Lists and deletes artifacts by re-reading the store directory
#[derive(Debug, Clone)]
pub struct Catalog {
    store: Store,
}

impl Catalog {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Every artifact the job runner could have written, in directory order.
    ///
    /// A single failing stat fails the whole listing.
    pub async fn list(&self) -> Result<Vec<StoredFile>, CatalogError> {
        let mut entries = ReadDirStream::new(fs::read_dir(self.store.root()).await?);
        let mut files = Vec::new();

        while let Some(entry) = entries.next().await {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if !name.starts_with(ARTIFACT_PREFIX) || !is_safe_name(&name) {
                continue;
            }

            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            // Not every filesystem records a birth time
            let created = metadata.created().or_else(|_| metadata.modified())?;

            files.push(StoredFile {
                access_url: access_url(&name),
                size: metadata.len(),
                created_at: DateTime::<Utc>::from(created),
                name,
            });
        }

        debug!("listed {} artifacts", files.len());
        Ok(files)
    }

    /// Removes a single file from the store
    pub async fn delete_one(&self, name: &str) -> Result<(), CatalogError> {
        let path = self.store.resolve(name).ok_or(CatalogError::NotFound)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("deleted {}", name);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(CatalogError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes every file in the store directory, artifact or not.
    ///
    /// Stops at the first failure; files removed before it stay removed.
    pub async fn delete_all(&self) -> Result<usize, CatalogError> {
        let mut entries = ReadDirStream::new(fs::read_dir(self.store.root()).await?);
        let mut count = 0;

        while let Some(entry) = entries.next().await {
            let entry = entry?;
            fs::remove_file(entry.path()).await?;
            count += 1;
        }

        info!("deleted {} files", count);
        Ok(count)
    }
}
