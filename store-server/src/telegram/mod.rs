//! Telegram Bot adapter
//!
//! Thin dispatcher over the Bot REST API; no business logic lives here.
//! The workflow engine talks to the [`Notifier`] trait and receives typed
//! [`NotifyError`]s, so one uniform catch policy covers every send. The
//! concrete client is constructed once at startup and injected (no global
//! bot handle).

mod client;
pub mod messages;

pub use client::TelegramClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures surfaced by the messaging platform.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Telegram transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Telegram API error: {description}")]
    Api { description: String },

    #[error("Telegram response missing field: {0}")]
    MalformedResponse(&'static str),
}

/// Inline keyboard attached to an outgoing message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    /// An empty keyboard; editing a message to this strips its buttons.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Single row of buttons.
    pub fn row(buttons: Vec<InlineKeyboardButton>) -> Self {
        Self {
            inline_keyboard: vec![buttons],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineKeyboardButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Outbound messaging operations used by the confirmation workflow.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Answer a callback query; `show_alert` pops a modal instead of a toast.
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: &str,
        show_alert: bool,
    ) -> Result<(), NotifyError>;

    /// Send a Markdown message to a chat.
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), NotifyError>;

    /// Send a Markdown message with an inline keyboard; returns the new
    /// message id (needed later to strip the buttons).
    async fn send_message_with_buttons(
        &self,
        chat_id: &str,
        text: &str,
        markup: InlineKeyboardMarkup,
    ) -> Result<i64, NotifyError>;

    /// Replace a message's inline keyboard (empty markup removes it).
    async fn edit_message_buttons(
        &self,
        chat_id: &str,
        message_id: i64,
        markup: InlineKeyboardMarkup,
    ) -> Result<(), NotifyError>;
}
