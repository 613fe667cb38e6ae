use super::ApiError;
use crate::server::SharedState;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

pub async fn serve_preview(
    State(state): State<SharedState>,
    Path(handle): Path<Uuid>,
) -> Result<Response, ApiError> {
    let (bytes, content_type) = state
        .previews
        .get(&handle)
        .ok_or(ApiError::PreviewNotFound)?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        bytes,
    )
        .into_response())
}
