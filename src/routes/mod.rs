use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

pub mod audio;
pub mod auth;
pub mod health;
pub mod labelers;
pub mod metrics;

/// Build the `/api` router with its middleware stack.
pub fn router(state: AppState) -> Router {
    let body_limit = state.policy.max_upload_bytes;

    let auth = Router::new()
        .route("/login", post(auth::login))
        .route("/me", get(auth::me));

    let audio = Router::new()
        .route("/upload-audio", post(audio::upload_audio))
        .route("/label-items", get(audio::label_items))
        .route("/labeled-items", post(audio::submit_label))
        .route("/create-labeler", post(labelers::create_labeler))
        .route("/labelers", get(labelers::list_labelers));

    Router::new()
        .route("/api/health", get(health::health_check))
        .nest("/api/auth", auth)
        .nest("/api/audio", audio)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
}
