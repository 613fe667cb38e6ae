use crate::classification::UnsupportedImage;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Session {0} not found")]
    SessionNotFound(Uuid),
    #[error("Unknown example image: {0}")]
    UnknownExample(String),
    #[error("Asset not found: {0}")]
    AssetNotFound(String),
    #[error("Failed to read asset: {0}")]
    AssetRead(std::io::Error),
    #[error("Preview not found")]
    PreviewNotFound,
    #[error("{0}")]
    UnsupportedImage(#[from] UnsupportedImage),
    #[error("Classification task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("Metrics encoding failed: {0}")]
    Metrics(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::SessionNotFound(_)
            | ApiError::UnknownExample(_)
            | ApiError::AssetNotFound(_)
            | ApiError::PreviewNotFound => StatusCode::NOT_FOUND,
            ApiError::UnsupportedImage(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::AssetRead(_) | ApiError::Task(_) | ApiError::Metrics(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}
