//! Inbound action webhook.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use bot::{ActionEvent, Reply};
use serde::Serialize;
use store::DocumentStore;

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct EventResponse {
    /// Direct answer to the actor; `null` when the engine already replied
    /// through a notification.
    pub reply: Option<Reply>,
}

/// POST /events
///
/// Rate limiting and refused actions are answered in `reply` with a 200.
pub async fn handle<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<ActionEvent>, JsonRejection>,
) -> Result<Json<EventResponse>, ApiError> {
    let Json(event) = payload.inspect_err(|_| {
        metrics::counter!("events_rejected_total").increment(1);
    })?;
    let reply = state.bot.handle(event).await;
    Ok(Json(EventResponse { reply }))
}
