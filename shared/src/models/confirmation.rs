//! Confirmation Session Model

use serde::{Deserialize, Serialize};

/// One live confirmation session per order (确认会话).
///
/// The row's existence is the sole authority for whether a callback may
/// still act on its order: it is consumed exactly once, either by the
/// atomic claim in the workflow engine or by the expiry sweeper. Order
/// number and total are snapshotted at creation so the prompt and the
/// follow-up notifications stay consistent with what the customer saw.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ConfirmationSession {
    pub order_id: i64,
    pub order_number: String,
    pub total_amount: f64,
    /// Destination chat for the confirmation prompt. Kept as a string:
    /// the Bot API accepts numeric ids and usernames alike.
    pub chat_id: String,
    pub created_at: i64,
    pub expires_at: i64,
}

impl ConfirmationSession {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at < now
    }

    /// Remaining lifetime in milliseconds (0 when already expired)
    pub fn remaining_ms(&self, now: i64) -> i64 {
        (self.expires_at - now).max(0)
    }
}
