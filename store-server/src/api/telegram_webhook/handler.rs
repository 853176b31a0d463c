//! Telegram Webhook Handler

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::confirmation::{CallbackAction, CallbackEvent};
use crate::core::ServerState;

// Inbound payload shapes. Everything optional: the platform sends many
// update kinds and this route only cares about button presses.

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: Option<i64>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub data: Option<String>,
    pub message: Option<CallbackMessage>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackMessage {
    pub message_id: i64,
    pub chat: Chat,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Receive a webhook update.
///
/// Always returns `{"ok": true}`. The body is read raw and parsed
/// leniently so that even an unparseable payload gets a 200 and the
/// platform stops redelivering it.
pub async fn receive(State(state): State<ServerState>, body: Bytes) -> Json<Value> {
    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            tracing::warn!(error = %e, "📨 Webhook payload not understood, acknowledging anyway");
            return Json(json!({ "ok": true }));
        }
    };

    let Some(callback) = update.callback_query else {
        // Not a button press (message, edited_message, ...): fine, ignore.
        tracing::debug!("📨 Webhook update without callback_query, ignoring");
        return Json(json!({ "ok": true }));
    };

    let Some(event) = callback_event(&callback) else {
        tracing::warn!(
            callback_id = %callback.id,
            data = callback.data.as_deref().unwrap_or(""),
            "📨 Callback with unrecognized data, acknowledging as no-op"
        );
        return Json(json!({ "ok": true }));
    };

    // Internal errors stop here: logged, never propagated as an HTTP
    // error, because platform-side retries multiply duplicates.
    match state.confirmation.handle_callback(event).await {
        Ok(outcome) => {
            tracing::info!(callback_id = %callback.id, outcome = ?outcome, "Callback resolved");
        }
        Err(e) => {
            tracing::error!(callback_id = %callback.id, error = %e, "❌ Callback handling failed");
        }
    }

    Json(json!({ "ok": true }))
}

/// Normalize a callback query into a workflow event.
///
/// `None` when the button data is not ours or the message context is
/// missing (e.g. a press on a message too old for the platform to echo).
fn callback_event(callback: &CallbackQuery) -> Option<CallbackEvent> {
    let data = callback.data.as_deref()?;
    let (action, order_id) = parse_callback_data(data)?;
    let message = callback.message.as_ref()?;

    Some(CallbackEvent {
        action,
        order_id,
        callback_id: callback.id.clone(),
        chat_id: message.chat.id.to_string(),
        message_id: message.message_id,
    })
}

/// Parse the opaque button data: `confirm_order_<id>` / `cancel_order_<id>`.
fn parse_callback_data(data: &str) -> Option<(CallbackAction, i64)> {
    let (action, rest) = if let Some(rest) = data.strip_prefix("confirm_order_") {
        (CallbackAction::Confirm, rest)
    } else if let Some(rest) = data.strip_prefix("cancel_order_") {
        (CallbackAction::Cancel, rest)
    } else {
        return None;
    };

    rest.parse::<i64>().ok().map(|id| (action, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_confirm_and_cancel_data() {
        assert_eq!(
            parse_callback_data("confirm_order_42"),
            Some((CallbackAction::Confirm, 42))
        );
        assert_eq!(
            parse_callback_data("cancel_order_7"),
            Some((CallbackAction::Cancel, 7))
        );
    }

    #[test]
    fn rejects_foreign_or_malformed_data() {
        assert_eq!(parse_callback_data(""), None);
        assert_eq!(parse_callback_data("confirm_order_"), None);
        assert_eq!(parse_callback_data("confirm_order_abc"), None);
        assert_eq!(parse_callback_data("something_else_42"), None);
        assert_eq!(parse_callback_data("confirm_order_42_extra"), None);
    }

    #[test]
    fn update_without_callback_deserializes() {
        let update: Update =
            serde_json::from_str(r#"{"update_id": 5, "message": {"text": "hi"}}"#).unwrap();
        assert!(update.callback_query.is_none());
    }

    #[test]
    fn full_callback_payload_normalizes_to_event() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 6,
                "callback_query": {
                    "id": "cb-99",
                    "data": "confirm_order_1234",
                    "message": {
                        "message_id": 55,
                        "chat": { "id": 987654321 },
                        "text": "prompt"
                    }
                }
            }"#,
        )
        .unwrap();

        let callback = update.callback_query.unwrap();
        let event = callback_event(&callback).unwrap();
        assert_eq!(event.action, CallbackAction::Confirm);
        assert_eq!(event.order_id, 1234);
        assert_eq!(event.callback_id, "cb-99");
        assert_eq!(event.chat_id, "987654321");
        assert_eq!(event.message_id, 55);
    }

    #[test]
    fn callback_without_message_context_is_dropped() {
        let callback = CallbackQuery {
            id: "cb-1".to_string(),
            data: Some("confirm_order_1".to_string()),
            message: None,
        };
        assert!(callback_event(&callback).is_none());
    }
}
