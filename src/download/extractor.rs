use std::path::Path;

use async_trait::async_trait;

/// Options handed to the extractor for every fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Format selector, `best` picks the best single file
    pub format: String,
    /// Keep output names to a portable character set
    pub restrict_filenames: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            format: "best".to_string(),
            restrict_filenames: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractorError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("extractor i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// The tool ran and reported failure, carrying its own message
    #[error("{0}")]
    Failed(String),
}

/// An external tool that fetches the media behind `url` into `destination`.
///
/// One call is one attempt: implementations don't retry and don't time out.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        options: &FetchOptions,
    ) -> Result<(), ExtractorError>;
}
