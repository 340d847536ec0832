//! Catalog read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use domain::{MenuItem, MenuItemId};
use store::DocumentStore;

use crate::AppState;
use crate::error::ApiError;

/// GET /menu: every item, sorted by name.
#[tracing::instrument(skip(state))]
pub async fn list<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<MenuItem>>, ApiError> {
    Ok(Json(state.bot.catalog().list_items().await?))
}

/// GET /menu/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<MenuItem>, ApiError> {
    state
        .bot
        .catalog()
        .get_item(&MenuItemId::from(id.as_str()))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Menu item {id} not found")))
}
