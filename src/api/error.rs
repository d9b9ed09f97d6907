use crate::services::gallery::GalleryError;
use crate::services::upload_pipeline::UploadError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Gallery(#[from] GalleryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Upload(e) => {
                tracing::error!("Error uploading files: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Gallery(e) => {
                tracing::error!("Error fetching gallery: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
