//! End-to-end confirmation flow over the HTTP surface: checkout creates the
//! order and the session, then the webhook route resolves button presses
//! exactly once — whatever the platform redelivers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::util::ServiceExt;

use shared::models::OrderStatus;
use store_server::confirmation::ConfirmationService;
use store_server::telegram::{InlineKeyboardMarkup, Notifier, NotifyError};
use store_server::{Config, DbService, ServerState};

/// Outbound calls recorded instead of hitting the Bot API.
#[derive(Default)]
struct FakeTelegram {
    sent: Mutex<Vec<(String, String)>>,
    answers: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for FakeTelegram {
    async fn answer_callback(
        &self,
        _callback_id: &str,
        text: &str,
        _show_alert: bool,
    ) -> Result<(), NotifyError> {
        self.answers.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn send_message_with_buttons(
        &self,
        chat_id: &str,
        text: &str,
        _markup: InlineKeyboardMarkup,
    ) -> Result<i64, NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(1001)
    }

    async fn edit_message_buttons(
        &self,
        _chat_id: &str,
        _message_id: i64,
        _markup: InlineKeyboardMarkup,
    ) -> Result<(), NotifyError> {
        Ok(())
    }
}

fn test_config() -> Config {
    Config {
        http_port: 0,
        database_path: ":memory:".into(),
        log_level: "info".into(),
        log_dir: None,
        environment: "test".into(),
        telegram_bot_token: "test-token".into(),
        telegram_api_base: "http://localhost:1".into(),
        telegram_admin_chat_id: Some("admin-chat".into()),
        telegram_webhook_domain: None,
        confirmation_ttl_hours: 24,
    }
}

async fn test_app() -> (Router, Arc<FakeTelegram>) {
    let config = test_config();
    let pool = DbService::open_in_memory().await.unwrap().pool;
    let telegram = Arc::new(FakeTelegram::default());
    let notifier: Arc<dyn Notifier> = telegram.clone();
    let confirmation = ConfirmationService::new(
        pool.clone(),
        notifier.clone(),
        config.telegram_admin_chat_id.clone(),
        config.confirmation_ttl_ms(),
    );
    let state = ServerState::new(config, pool, notifier, confirmation);
    let app = store_server::api::build_router().with_state(state);
    (app, telegram)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn checkout_payload(order_number: &str) -> Value {
    json!({
        "order_number": order_number,
        "total_amount": 499.0,
        "customer_name": "Imane K.",
        "customer_phone": "+212655443322",
        "customer_address": "8 Rue Ibn Battouta",
        "customer_city": "Marrakech",
        "telegram_chat_id": "555000111",
        "items": [
            { "product_id": "prod-9", "name": "Théière en cuivre", "quantity": 1, "price": 499.0 }
        ]
    })
}

fn button_press(callback_id: &str, data: &str) -> Value {
    json!({
        "update_id": 1,
        "callback_query": {
            "id": callback_id,
            "data": data,
            "message": {
                "message_id": 1001,
                "chat": { "id": 555000111 }
            }
        }
    })
}

#[tokio::test]
async fn checkout_then_confirm_end_to_end() {
    let (app, telegram) = test_app().await;

    let (status, created) = post_json(&app, "/api/orders/", checkout_payload("CMD-9001")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["confirmation_requested"], true);
    let order_id = created["id"].as_i64().unwrap();

    // Customer got the prompt
    assert_eq!(telegram.sent.lock().unwrap().len(), 1);

    // Button press comes back through the webhook
    let data = format!("confirm_order_{order_id}");
    let (status, ack) = post_json(&app, "/api/telegram/webhook", button_press("cb-1", &data)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["ok"], true);

    let (status, fetched) = get_json(&app, &format!("/api/orders/{order_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["status"], "confirmed");
    assert!(fetched["confirmed_at"].is_i64());
    assert!(fetched["cancelled_at"].is_null());

    // Prompt + customer confirmation + admin summary
    let sent = telegram.sent.lock().unwrap();
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().any(|(chat, _)| chat == "admin-chat"));
}

#[tokio::test]
async fn redelivered_confirm_does_not_double_notify() {
    let (app, telegram) = test_app().await;

    let (_, created) = post_json(&app, "/api/orders/", checkout_payload("CMD-9002")).await;
    let order_id = created["id"].as_i64().unwrap();
    let data = format!("confirm_order_{order_id}");

    let (s1, _) = post_json(&app, "/api/telegram/webhook", button_press("cb-1", &data)).await;
    let (s2, _) = post_json(&app, "/api/telegram/webhook", button_press("cb-1", &data)).await;
    assert_eq!(s1, StatusCode::OK);
    assert_eq!(s2, StatusCode::OK);

    // One prompt + one notification set, then the duplicate only answered
    assert_eq!(telegram.sent.lock().unwrap().len(), 3);
    assert_eq!(telegram.answers.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn cancel_after_confirm_keeps_confirmed_state() {
    let (app, _telegram) = test_app().await;

    let (_, created) = post_json(&app, "/api/orders/", checkout_payload("CMD-9003")).await;
    let order_id = created["id"].as_i64().unwrap();

    let confirm = format!("confirm_order_{order_id}");
    let cancel = format!("cancel_order_{order_id}");
    post_json(&app, "/api/telegram/webhook", button_press("cb-1", &confirm)).await;
    post_json(&app, "/api/telegram/webhook", button_press("cb-2", &cancel)).await;

    let (_, fetched) = get_json(&app, &format!("/api/orders/{order_id}")).await;
    assert_eq!(fetched["status"], "confirmed");
    assert!(fetched["cancelled_at"].is_null());
}

#[tokio::test]
async fn webhook_acknowledges_unknown_and_malformed_payloads() {
    let (app, telegram) = test_app().await;

    // Not a callback at all
    let (status, ack) = post_json(
        &app,
        "/api/telegram/webhook",
        json!({ "update_id": 3, "message": { "text": "hello" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["ok"], true);

    // Malformed button data
    let (status, ack) = post_json(
        &app,
        "/api/telegram/webhook",
        button_press("cb-4", "confirm_order_not_a_number"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["ok"], true);

    // Callback for an order that never existed: alert only, no sends
    let (status, ack) = post_json(
        &app,
        "/api/telegram/webhook",
        button_press("cb-5", "confirm_order_424242"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ack["ok"], true);
    assert!(telegram.sent.lock().unwrap().is_empty());
    assert_eq!(telegram.answers.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn guest_checkout_notifies_admin_instead_of_prompting() {
    let (app, telegram) = test_app().await;

    let mut payload = checkout_payload("CMD-9004");
    payload.as_object_mut().unwrap().remove("telegram_chat_id");
    payload["guest_email"] = json!("invite@example.com");

    let (status, created) = post_json(&app, "/api/orders/", payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["confirmation_requested"], false);

    let sent = telegram.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "admin-chat");
    assert!(sent[0].1.contains("Nouvelle Commande"));
    assert!(sent[0].1.contains("CMD-9004"));
}

#[tokio::test]
async fn checkout_rejects_invalid_payload() {
    let (app, _telegram) = test_app().await;

    let mut payload = checkout_payload("CMD-9005");
    payload["items"] = json!([]);

    let (status, body) = post_json(&app, "/api/orders/", payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");
}
