//! Order read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{ChatId, OrderId};
use domain::Order;
use store::DocumentStore;

use crate::AppState;
use crate::error::ApiError;

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    state
        .bot
        .orders()
        .get_order(&OrderId::from(id.as_str()))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))
}

/// GET /customers/{chat_id}/orders: a customer's orders, oldest first.
#[tracing::instrument(skip(state))]
pub async fn for_customer<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(chat_id): Path<i64>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let orders = state
        .bot
        .orders()
        .orders_for_customer(ChatId::new(chat_id))
        .await?;
    Ok(Json(orders))
}
