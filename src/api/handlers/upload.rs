use crate::AppState;
use crate::api::error::AppError;
use crate::models::UploadedObject;
use crate::services::upload_pipeline::IncomingFile;
use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

/// Multipart field carrying the uploaded files.
pub const MEDIA_FIELD: &str = "media";

/// Multipart form accepted by `POST /upload`.
#[derive(ToSchema)]
pub struct UploadForm {
    /// One or more file parts
    #[schema(value_type = Vec<String>)]
    pub media: Vec<Vec<u8>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub results: Vec<UploadedObject>,
}

fn map_multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(
        content = UploadForm,
        content_type = "multipart/form-data",
        description = "Up to 10 files in the `media` field"
    ),
    responses(
        (status = 200, description = "Files uploaded successfully", body = UploadResponse),
        (status = 400, description = "Malformed multipart body or too many files"),
        (status = 401, description = "Unauthorized"),
        (status = 413, description = "Request body too large"),
        (status = 500, description = "Staging, transcoding or storage failure")
    ),
    security(
        ("basic" = [])
    ),
    tag = "media"
)]
pub async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let max_files = state.config.max_files_per_upload;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(map_multipart_error)? {
        let is_media = field.name() == Some(MEDIA_FIELD);

        if !is_media {
            if field.file_name().is_some() {
                return Err(AppError::BadRequest(format!(
                    "Unexpected file field '{}'",
                    field.name().unwrap_or_default()
                )));
            }
            continue;
        }

        if files.len() >= max_files {
            return Err(AppError::BadRequest(format!(
                "Too many files: at most {} per upload",
                max_files
            )));
        }

        let Some(original_name) = field.file_name().map(str::to_string) else {
            return Err(AppError::BadRequest(format!(
                "Field '{}' must carry a file",
                MEDIA_FIELD
            )));
        };
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(map_multipart_error)?;

        files.push(IncomingFile {
            original_name,
            content_type,
            data,
        });
    }

    info!("📦 Received {} file(s) for upload", files.len());

    let results = state.uploads.process_batch(files).await?;

    Ok(Json(UploadResponse {
        message: "Files uploaded successfully".to_string(),
        results,
    }))
}
