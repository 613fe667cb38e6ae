mod assets;
mod error;
mod health;
mod index;
mod metrics;
mod previews;
mod sessions;

use crate::server::SharedState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

pub use error::ApiError;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(index::index))
        .route("/health", get(health::healthcheck))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/examples", get(assets::list_examples))
        .route("/assets/{file}", get(assets::serve_asset))
        .route("/previews/{handle}", get(previews::serve_preview))
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/{id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route(
            "/sessions/{id}/image",
            put(sessions::select_file).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/sessions/{id}/examples/{name}",
            post(sessions::select_example),
        )
        .route("/sessions/{id}/model", put(sessions::set_model))
        .route("/sessions/{id}/classify", post(sessions::classify))
}
