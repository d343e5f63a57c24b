use crate::{
    errors::ApiError,
    storage::{Storage, StoredFile, upload_name},
};
use axum::{
    Json,
    extract::{
        Extension, Multipart, Path, Request,
        multipart::{MultipartError, MultipartRejection},
    },
    response::{IntoResponse, Response},
};
use chrono::{Local, SecondsFormat};
use futures::{StreamExt, TryStreamExt};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{info, warn};

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "file";

fn parse_error(e: MultipartError) -> ApiError {
    warn!("Rejecting upload: {e}");
    ApiError::bad_request("Failed to parse form")
}

pub async fn upload(
    Extension(storage): Extension<Arc<dyn Storage>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<String, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        warn!("Rejecting upload: {e}");
        ApiError::bad_request("Failed to parse form")
    })?;

    while let Some(field) = multipart.next_field().await.map_err(parse_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().and_then(upload_name) else {
            break;
        };

        let written = storage
            .save(&file_name, field.map_err(parse_error).boxed())
            .await?;
        info!("Stored {file_name} ({written} bytes)");

        return Ok(format!("File uploaded successfully: {file_name}"));
    }

    Err(ApiError::bad_request("Error retrieving file"))
}

pub async fn list_files(
    Extension(storage): Extension<Arc<dyn Storage>>,
) -> Result<Json<Vec<StoredFile>>, ApiError> {
    Ok(Json(storage.list().await?))
}

/// Streams the file back, with content type, range and conditional handling
/// left to `ServeFile`.
pub async fn download(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Path(name): Path<String>,
    req: Request,
) -> Result<Response, ApiError> {
    let file_path = storage.locate(&name).await?;
    Ok(ServeFile::new(file_path).oneshot(req).await.into_response())
}

pub async fn delete_file(
    Extension(storage): Extension<Arc<dyn Storage>>,
    Path(name): Path<String>,
) -> Result<String, ApiError> {
    storage.delete(&name).await?;
    info!("Deleted {name}");
    Ok(format!("File deleted successfully: {name}"))
}

pub async fn missing_name() -> ApiError {
    ApiError::bad_request("Filename not provided")
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn status() -> Json<Value> {
    Json(json!({
        "status": "running",
        "time": Local::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}
