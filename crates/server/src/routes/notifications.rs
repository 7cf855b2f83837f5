use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use serde::Deserialize;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{Stream, StreamExt};
use tracing::info;

use service::notification::domain::Notification;

use crate::auth::{bearer_token, AuthUser};
use crate::errors::JsonApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    /// EventSource cannot set headers, so the token may ride in the query.
    token: Option<String>,
}

#[utoipa::path(get, path = "/notifications", tag = "notifications", responses((status = 200, description = "Own notifications, newest first"), (status = 401, description = "Unauthorized")))]
pub async fn list(user: AuthUser, State(state): State<AppState>) -> Result<Json<Vec<Notification>>, JsonApiError> {
    Ok(Json(state.notifications.list_for(user.id).await?))
}

/// Live connection for the signed-in user. Registers it in the socket
/// registry for as long as the stream is open.
pub async fn stream(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, JsonApiError> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .or_else(|| bearer_token(&headers).map(str::to_string))
        .ok_or_else(|| JsonApiError::unauthorized("Missing token"))?;
    let user = state.jwt.verify(&token)?;

    let (guard, rx) = state.registry.connect(user.id);
    info!(user_id = %user.id, conn = %guard.id(), "stream_opened");

    let connected = tokio_stream::once(Ok::<_, Infallible>(Event::default().event("connected").data("ok")));
    let events = BroadcastStream::new(rx).filter_map(move |result| {
        // the guard lives as long as the stream
        let _conn = guard.id();
        match result {
            Ok(ev) => Event::default().event(ev.event).json_data(&ev.payload).ok().map(Ok),
            Err(BroadcastStreamRecvError::Lagged(n)) => Event::default()
                .event("lagged")
                .json_data(serde_json::json!({ "missed": n }))
                .ok()
                .map(Ok),
        }
    });

    Ok(Sse::new(connected.chain(events)).keep_alive(KeepAlive::default()))
}
