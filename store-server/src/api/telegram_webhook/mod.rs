//! Telegram Webhook Module
//!
//! Entry point for the confirmation workflow. The platform redelivers
//! callbacks on non-2xx responses, and redelivery is exactly the failure
//! mode the workflow exists to absorb, so this route acknowledges
//! everything: unknown update kinds, malformed button data, even internal
//! engine errors.

mod handler;

pub use handler::{CallbackQuery, Update};

use axum::{Router, routing::post};

use crate::core::ServerState;

/// Webhook router. Public, no auth: the URL itself is the secret, as the
/// platform's webhook model prescribes.
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/telegram/webhook", post(handler::receive))
}
