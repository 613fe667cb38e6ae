use super::ApiError;
use crate::{
    assets::ExampleImage,
    classification::{ImageFile, ModelChoice},
    controller::{ClassifyOutcome, WorkflowController, WorkflowView},
    server::SharedState,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Instant};
use tracing::instrument;
use uuid::Uuid;

#[derive(Serialize)]
pub struct SessionCreated {
    id: Uuid,
    view: WorkflowView,
}

#[derive(Deserialize)]
pub struct ModelRequest {
    model: ModelChoice,
}

fn find_controller(state: &SharedState, id: Uuid) -> Result<Arc<WorkflowController>, ApiError> {
    state.sessions.get(&id).ok_or(ApiError::SessionNotFound(id))
}

#[instrument(skip(state))]
pub async fn create_session(
    State(state): State<SharedState>,
) -> (StatusCode, Json<SessionCreated>) {
    state.metrics.record_request("create_session");
    let (id, controller) = state.sessions.create();

    (
        StatusCode::CREATED,
        Json(SessionCreated {
            id,
            view: controller.current_view(),
        }),
    )
}

pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowView>, ApiError> {
    Ok(Json(find_controller(&state, id)?.current_view()))
}

#[instrument(skip(state))]
pub async fn delete_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.metrics.record_request("delete_session");
    if state.sessions.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

#[instrument(skip(state, image_data), fields(bytes = image_data.len()))]
pub async fn select_file(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    image_data: Bytes,
) -> Result<Json<WorkflowView>, ApiError> {
    state.metrics.record_request("select_file");
    let controller = find_controller(&state, id)?;
    let file = ImageFile::from_upload(image_data)?;

    controller.select_file(file);
    Ok(Json(controller.current_view()))
}

#[instrument(skip(state))]
pub async fn select_example(
    State(state): State<SharedState>,
    Path((id, name)): Path<(Uuid, String)>,
) -> Result<Json<WorkflowView>, ApiError> {
    state.metrics.record_request("select_example");
    let controller = find_controller(&state, id)?;
    let asset: ExampleImage = name.parse().map_err(|_| ApiError::UnknownExample(name))?;

    controller.select_example(asset).await;
    Ok(Json(controller.current_view()))
}

#[instrument(skip(state, request))]
pub async fn set_model(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ModelRequest>,
) -> Result<Json<WorkflowView>, ApiError> {
    state.metrics.record_request("set_model");
    let controller = find_controller(&state, id)?;

    controller.set_model(request.model);
    Ok(Json(controller.current_view()))
}

/// Runs the attempt on its own task so a closed connection cannot cut it short.
#[instrument(skip(state))]
pub async fn classify(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowView>, ApiError> {
    state.metrics.record_request("classify");
    let controller = find_controller(&state, id)?;
    let model = controller.current_view().model;

    let started = Instant::now();
    let outcome = tokio::spawn({
        let controller = controller.clone();
        async move { controller.classify().await }
    })
    .await?;

    if outcome != ClassifyOutcome::Skipped {
        state.metrics.record_classification(
            model.as_str(),
            outcome.as_str(),
            started.elapsed().as_millis() as u64,
        );
    }

    Ok(Json(controller.current_view()))
}
