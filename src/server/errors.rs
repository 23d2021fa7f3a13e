use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

use crate::catalog::CatalogError;
use crate::download::job::JobError;

pub const DOWNLOAD_FAILED: &str = "Video download failed";

/// Error body every failing endpoint answers with
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: String,
    details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: message.into(),
            details: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: CatalogError::NotFound.to_string(),
            details: None,
        }
    }

    pub fn internal(error: &str, details: impl ToString) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: error.to_string(),
            details: Some(details.to_string()),
        }
    }

    /// Extraction and verification failures look the same to the client
    pub fn job(e: JobError) -> Self {
        match e {
            JobError::Validation => Self::bad_request(e.to_string()),
            e => Self::internal(DOWNLOAD_FAILED, e),
        }
    }

    /// `error` describes what the catalog was asked to do
    pub fn catalog(error: &str, e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound => Self::not_found(),
            e => Self::internal(error, e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let details = self.details.as_deref().unwrap_or_default();
        if self.status.is_server_error() {
            error!("{}: {}", self.error, details);
        } else {
            warn!("{} {}", self.status, self.error);
        }

        let body = ErrorBody {
            error: self.error,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::download::extractor::ExtractorError;

    #[test]
    fn validation_is_a_bad_request() {
        let e = ApiError::job(JobError::Validation);
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.error, "URL cannot be empty");
        assert!(e.details.is_none());
    }

    #[test]
    fn job_failures_fold_into_500() {
        let verification = ApiError::job(JobError::Verification);
        let extraction = ApiError::job(JobError::Extraction(ExtractorError::Io(
            io::Error::other("boom"),
        )));

        for e in [&verification, &extraction] {
            assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(e.error, "Video download failed");
        }
        assert_eq!(
            verification.details.as_deref(),
            Some("Downloaded file not found")
        );
    }

    #[test]
    fn catalog_errors_map_to_404_and_500() {
        let missing = ApiError::catalog("Could not delete file", CatalogError::NotFound);
        assert_eq!(missing.status, StatusCode::NOT_FOUND);
        assert_eq!(missing.error, "File not found");

        let broken = ApiError::catalog(
            "Could not delete file",
            CatalogError::Storage(io::Error::from(io::ErrorKind::PermissionDenied)),
        );
        assert_eq!(broken.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(broken.error, "Could not delete file");
        assert!(broken.details.is_some());
    }
}
