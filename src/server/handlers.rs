use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Request, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::AppState;
use super::errors::{ApiError, DOWNLOAD_FAILED};
use crate::catalog::StoredFile;
use crate::download::job::DownloadRequest;

#[derive(Debug, Deserialize)]
pub struct DownloadPayload {
    url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    success: bool,
    download_url: String,
    filename: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteAllResponse {
    success: bool,
    message: &'static str,
    count: usize,
}

#[derive(Debug, Serialize)]
pub struct Success {
    success: bool,
}

/// `POST /download`
pub async fn download(
    State(state): State<AppState>,
    payload: Result<Json<DownloadPayload>, JsonRejection>,
) -> Result<Json<DownloadResponse>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let request = DownloadRequest {
        url: payload.url.unwrap_or_default(),
    };

    // The job owns its task so a client hanging up can't interrupt the extractor
    let jobs = state.jobs.clone();
    let done = tokio::spawn(async move { jobs.submit(request).await })
        .await
        .map_err(|e| ApiError::internal(DOWNLOAD_FAILED, e))?
        .map_err(ApiError::job)?;
    Ok(Json(DownloadResponse {
        success: true,
        download_url: done.access_url,
        filename: done.filename,
    }))
}

/// `GET /downloads`
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<StoredFile>>, ApiError> {
    let files = state
        .catalog
        .list()
        .await
        .map_err(|e| ApiError::catalog("Could not list downloads", e))?;
    Ok(Json(files))
}

/// `DELETE /downloads`
pub async fn delete_all(State(state): State<AppState>) -> Result<Json<DeleteAllResponse>, ApiError> {
    let count = state
        .catalog
        .delete_all()
        .await
        .map_err(|e| ApiError::catalog("Could not delete downloads", e))?;
    Ok(Json(DeleteAllResponse {
        success: true,
        message: "All downloads deleted",
        count,
    }))
}

/// `DELETE /downloads/{filename}`, the path segment arrives percent-decoded
pub async fn delete_one(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<Success>, ApiError> {
    state
        .catalog
        .delete_one(&filename)
        .await
        .map_err(|e| ApiError::catalog("Could not delete file", e))?;
    Ok(Json(Success { success: true }))
}

/// `GET /downloads/{filename}` serves the artifact itself, ranges included
pub async fn serve(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    let path = state.store.resolve(&filename).ok_or_else(ApiError::not_found)?;
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => Ok(response.into_response()),
        Err(never) => match never {},
    }
}
