use super::ApiError;
use crate::{assets::ExampleImage, server::SharedState};
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::instrument;

#[derive(Serialize)]
pub struct ExampleEntry {
    name: &'static str,
    url: String,
}

pub async fn list_examples() -> Json<Vec<ExampleEntry>> {
    Json(
        ExampleImage::ALL
            .into_iter()
            .map(|asset| ExampleEntry {
                name: asset.name(),
                url: asset.public_path(),
            })
            .collect(),
    )
}

/// Serves only the known example files from the assets directory.
#[instrument(skip(state))]
pub async fn serve_asset(
    State(state): State<SharedState>,
    Path(file): Path<String>,
) -> Result<Response, ApiError> {
    let asset = ExampleImage::from_file_name(&file).ok_or(ApiError::AssetNotFound(file))?;
    let path = state.assets_dir.join(asset.file_name());

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ApiError::AssetNotFound(asset.file_name().to_string()),
        _ => ApiError::AssetRead(e),
    })?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response())
}
