use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod notifications;
pub mod pets;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service is up")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics() -> impl IntoResponse {
    match service::metrics::encode_metrics() {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("metrics encode error: {e}")),
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;
    Json(ApiDoc::openapi())
}

/// Build the full application router: public listing, user and admin pet
/// routes, notifications and the operational endpoints.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let ops = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api-docs/openapi.json", get(openapi_json));

    let pet_routes = Router::new()
        .route("/pets", get(pets::list_approved).post(pets::create))
        .route("/pets/pending", get(pets::list_pending))
        .route("/pets/submit", post(pets::submit))
        .route("/pets/:id", get(pets::get).put(pets::update).delete(pets::delete))
        .route("/pets/:id/approve", post(pets::approve))
        .route("/pets/:id/adoption-requests", post(pets::request_adoption))
        .route("/pets/:id/adopt", post(pets::adopt));

    let notification_routes = Router::new()
        .route("/notifications", get(notifications::list))
        .route("/notifications/stream", get(notifications::stream));

    ops.merge(pet_routes)
        .merge(notification_routes)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
