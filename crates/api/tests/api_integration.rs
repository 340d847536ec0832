//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::ChatId;
use domain::{Money, NewMenuItem, NotificationDispatcher, Quantity, RecordingNotifier};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use store::InMemoryDocumentStore;
use tower::ServiceExt;

use api::AppState;
use api::config::Config;

const ADMIN: i64 = 1;
const CUSTOMER: i64 = 500;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (
    axum::Router,
    Arc<AppState<InMemoryDocumentStore>>,
    Arc<RecordingNotifier>,
) {
    let config = Config {
        admin_chat_id: ChatId::new(ADMIN),
        ..Config::default()
    };
    let notifier = Arc::new(RecordingNotifier::new());
    let dispatcher = NotificationDispatcher::new(notifier.clone(), config.admin_chat_id);
    let state = api::create_state(InMemoryDocumentStore::new(), dispatcher, &config);
    let app = api::create_app(state.clone(), get_metrics_handle());
    (app, state, notifier)
}

async fn publish(state: &AppState<InMemoryDocumentStore>, name: &str) -> String {
    state
        .bot
        .catalog()
        .add_item(NewMenuItem::new(
            name,
            vec![
                Quantity::new("Option 1", "1/8", Money::from_units(25)),
                Quantity::new("Option 2", "1/4", Money::from_units(45)),
            ],
        ))
        .await
        .unwrap()
        .id
        .to_string()
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_event(app: &axum::Router, event: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/events")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&event).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn customer() -> Value {
    json!({ "id": CUSTOMER, "handle": "jane", "firstName": "Jane", "lastName": "Doe" })
}

#[tokio::test]
async fn test_health_check() {
    let (app, _, _) = setup();

    let (status, json) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, state, _) = setup();
    let item = publish(&state, "Haze").await;
    post_event(
        &app,
        json!({ "actor": customer(), "action": "add-to-cart", "itemId": item, "quantityIndex": 0 }),
    )
    .await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("cart_operations_total"));
}

#[tokio::test]
async fn test_start_event_replies() {
    let (app, state, _) = setup();

    let (status, json) = post_event(&app, json!({ "actor": customer(), "action": "start" })).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["reply"]["text"].as_str().unwrap().contains("Welcome"));
    let remembered = state
        .bot
        .customers()
        .get(ChatId::new(CUSTOMER))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(remembered.username.as_deref(), Some("jane"));
}

#[tokio::test]
async fn test_order_flow_over_http() {
    let (app, state, notifier) = setup();
    let item = publish(&state, "Haze").await;

    let (status, json) = post_event(
        &app,
        json!({ "actor": customer(), "action": "callback", "data": format!("quantity_{item}_1") }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["reply"]["text"].as_str().unwrap().contains("Added to cart"));

    let (status, json) = post_event(&app, json!({ "actor": customer(), "action": "confirm" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["reply"].is_null());
    state.bot.dispatcher().flush().await;

    let alerts = notifier.sent_to(ChatId::new(ADMIN));
    assert_eq!(alerts.len(), 1);

    let (status, orders) = get(&app, &format!("/customers/{CUSTOMER}/orders")).await;
    assert_eq!(status, StatusCode::OK);
    let orders = orders.as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["status"], "pending");
    assert_eq!(orders[0]["totalAmount"], 45);
    let order_id = orders[0]["id"].as_str().unwrap().to_string();

    let (status, json) = post_event(
        &app,
        json!({
            "actor": { "id": ADMIN },
            "action": "admin-status-update",
            "orderId": order_id,
            "status": "confirmed"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        json["reply"]["text"]
            .as_str()
            .unwrap()
            .contains("status updated to: confirmed")
    );

    let (status, order) = get(&app, &format!("/orders/{order_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["status"], "confirmed");
    assert_eq!(order["customerUsername"], "jane");
}

#[tokio::test]
async fn test_malformed_event_is_rejected() {
    let (app, _, _) = setup();

    let (status, json) = post_event(&app, json!({ "actor": customer(), "action": "teleport" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_get_nonexistent_order() {
    let (app, _, _) = setup();

    let (status, json) = get(&app, "/orders/ORD-1-abcd").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("ORD-1-abcd"));
}

#[tokio::test]
async fn test_menu_listing() {
    let (app, state, _) = setup();
    let kush = publish(&state, "Kush").await;
    publish(&state, "Haze").await;

    let (status, json) = get(&app, "/menu").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Haze", "Kush"]);

    let (status, json) = get(&app, &format!("/menu/{kush}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["quantities"][1]["price"], 45);
    assert_eq!(json["isAvailable"], true);

    let (status, _) = get(&app, "/menu/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
