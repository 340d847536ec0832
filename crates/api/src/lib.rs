//! HTTP front end for the chat commerce bot.
//!
//! Accepts action events from the chat transport, exposes read-only catalog
//! and order endpoints, and serves health and Prometheus metrics.

pub mod config;
pub mod error;
pub mod notifier;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use bot::{BotService, BotSettings};
use domain::{NotificationDispatcher, Repositories};
use metrics_exporter_prometheus::PrometheusHandle;
use store::DocumentStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state.
pub struct AppState<S> {
    pub bot: BotService<S>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::status::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::status::health))
        .route("/events", post(routes::events::handle::<S>))
        .route("/menu", get(routes::menu::list::<S>))
        .route("/menu/{id}", get(routes::menu::get::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/customers/{chat_id}/orders",
            get(routes::orders::for_customer::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires repositories and the bot router over `store`.
pub fn create_state<S: DocumentStore + Clone + 'static>(
    store: S,
    dispatcher: NotificationDispatcher,
    config: &Config,
) -> Arc<AppState<S>> {
    let repositories = Repositories::new(store, config.cache_capacity);
    let settings = BotSettings {
        policy: config.order_transitions,
        actions_per_window: config.rate_limit_per_minute,
        window: Duration::from_secs(60),
    };

    Arc::new(AppState {
        bot: BotService::new(&repositories, dispatcher, settings),
    })
}
