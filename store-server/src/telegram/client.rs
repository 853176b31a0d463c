//! Telegram Bot REST client (no SDK dependency)

use super::{InlineKeyboardMarkup, Notifier, NotifyError};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;

/// Bot API client. Cheap to clone; holds a pooled reqwest client.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    /// `api_base` is normally `https://api.telegram.org`; tests point it at
    /// a local stub.
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// POST a Bot API method, unwrap the `{ok, result, description}` envelope.
    async fn call(&self, method: &str, body: Value) -> Result<Value, NotifyError> {
        let resp: Value = self
            .http
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if resp["ok"].as_bool() == Some(true) {
            Ok(resp["result"].clone())
        } else {
            Err(NotifyError::Api {
                description: resp["description"]
                    .as_str()
                    .unwrap_or("unknown Telegram error")
                    .to_string(),
            })
        }
    }

    /// Register the webhook for `domain` (delete-then-set, as the setup
    /// script of the storefront always did).
    pub async fn set_webhook(&self, domain: &str) -> Result<(), NotifyError> {
        if let Err(e) = self.call("deleteWebhook", json!({})).await {
            tracing::warn!(error = %e, "Could not delete existing webhook");
        }

        let webhook_url = format!("https://{domain}/api/telegram/webhook");
        self.call(
            "setWebhook",
            json!({ "url": webhook_url, "allowed_updates": ["callback_query"] }),
        )
        .await?;
        tracing::info!(url = %webhook_url, "✅ Telegram webhook registered");
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<(), NotifyError> {
        self.call("deleteWebhook", json!({})).await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: &str,
        show_alert: bool,
    ) -> Result<(), NotifyError> {
        self.call(
            "answerCallbackQuery",
            json!({
                "callback_query_id": callback_id,
                "text": text,
                "show_alert": show_alert,
            }),
        )
        .await?;
        Ok(())
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        self.call(
            "sendMessage",
            json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "Markdown",
            }),
        )
        .await?;
        Ok(())
    }

    async fn send_message_with_buttons(
        &self,
        chat_id: &str,
        text: &str,
        markup: InlineKeyboardMarkup,
    ) -> Result<i64, NotifyError> {
        let result = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": chat_id,
                    "text": text,
                    "parse_mode": "Markdown",
                    "reply_markup": markup,
                }),
            )
            .await?;

        result["message_id"]
            .as_i64()
            .ok_or(NotifyError::MalformedResponse("message_id"))
    }

    async fn edit_message_buttons(
        &self,
        chat_id: &str,
        message_id: i64,
        markup: InlineKeyboardMarkup,
    ) -> Result<(), NotifyError> {
        self.call(
            "editMessageReplyMarkup",
            json!({
                "chat_id": chat_id,
                "message_id": message_id,
                "reply_markup": markup,
            }),
        )
        .await?;
        Ok(())
    }
}
