//! Confirmation Workflow Engine

use std::sync::Arc;

use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::repository::{RepoError, confirmation_session, order};
use crate::telegram::{
    InlineKeyboardButton, InlineKeyboardMarkup, Notifier, messages,
};
use shared::models::{ConfirmationSession, Order};
use shared::util::now_millis;

/// What the customer pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Confirm,
    Cancel,
}

/// Normalized inbound button press, produced by the webhook receiver.
/// Transient, never persisted.
#[derive(Debug, Clone)]
pub struct CallbackEvent {
    pub action: CallbackAction,
    pub order_id: i64,
    /// Platform callback id, needed to answer the query
    pub callback_id: String,
    /// Chat carrying the originating prompt message
    pub chat_id: String,
    /// The prompt message itself (its buttons get stripped on success)
    pub message_id: i64,
}

/// Externally observable result of one callback delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    Confirmed,
    Cancelled,
    /// No session: never existed, expired-and-swept, or already consumed by
    /// a prior (possibly concurrent) delivery. One uniform answer covers
    /// all three: the customer cannot tell them apart and neither must we.
    AlreadyHandledOrExpired,
    /// Claimed a session that was past its TTL; no order mutation happened.
    Expired,
    /// The order row was no longer `pending` despite a successful claim:
    /// some unrelated path (e.g. manual admin cancellation) raced the order.
    GuardRejected,
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The claim itself failed. Nothing was consumed; the customer can
    /// simply tap again.
    #[error("session claim failed: {0}")]
    Claim(RepoError),

    /// The order-status write failed AFTER the session was irrevocably
    /// claimed. The session-based retry path is gone: this order needs
    /// manual reconciliation.
    #[error("order mutation failed after session claim: {0}")]
    Persistence(RepoError),

    /// Could not create the confirmation session when starting the flow.
    #[error("session creation failed: {0}")]
    Begin(RepoError),

    /// A live session already exists for this order.
    #[error("confirmation already pending for order {0}")]
    AlreadyPending(i64),
}

/// Drives the confirmation state machine. Holds the durable stores and the
/// injected notifier; constructed once at startup and cloned per request.
#[derive(Clone)]
pub struct ConfirmationService {
    pool: SqlitePool,
    notifier: Arc<dyn Notifier>,
    admin_chat_id: Option<String>,
    ttl_ms: i64,
}

impl ConfirmationService {
    pub fn new(
        pool: SqlitePool,
        notifier: Arc<dyn Notifier>,
        admin_chat_id: Option<String>,
        ttl_ms: i64,
    ) -> Self {
        Self {
            pool,
            notifier,
            admin_chat_id,
            ttl_ms,
        }
    }

    /// Start the confirmation flow for a freshly created pending order:
    /// register the session, then send the prompt with the confirm/cancel
    /// buttons. A failed prompt send never fails the order; it is logged
    /// and the session stays live for the TTL.
    pub async fn begin(&self, order: &Order, chat_id: &str) -> Result<(), WorkflowError> {
        let now = now_millis();
        let session = ConfirmationSession {
            order_id: order.id,
            order_number: order.order_number.clone(),
            total_amount: order.total_amount,
            chat_id: chat_id.to_string(),
            created_at: now,
            expires_at: now + self.ttl_ms,
        };

        match confirmation_session::create(&self.pool, &session).await {
            Ok(()) => {}
            Err(RepoError::Duplicate(_)) => {
                return Err(WorkflowError::AlreadyPending(order.id));
            }
            Err(e) => return Err(WorkflowError::Begin(e)),
        }

        let markup = InlineKeyboardMarkup::row(vec![
            InlineKeyboardButton::new("✅ Confirmer", messages::confirm_callback_data(order.id)),
            InlineKeyboardButton::new("❌ Annuler", messages::cancel_callback_data(order.id)),
        ]);
        let prompt = messages::confirmation_prompt(&order.order_number, order.total_amount);

        match self
            .notifier
            .send_message_with_buttons(chat_id, &prompt, markup)
            .await
        {
            Ok(message_id) => {
                tracing::info!(
                    order_id = order.id,
                    message_id,
                    "Confirmation prompt sent"
                );
            }
            Err(e) => {
                tracing::error!(
                    order_id = order.id,
                    error = %e,
                    "Failed to send confirmation prompt; session stays live"
                );
            }
        }

        Ok(())
    }

    /// Resolve one inbound callback into exactly one outcome.
    ///
    /// The session claim in step 1 is the only serialization point:
    /// whoever gets the row is the unique authorized actor for this
    /// order's transition, every other delivery takes the uniform
    /// "already handled / expired" path.
    pub async fn handle_callback(
        &self,
        event: CallbackEvent,
    ) -> Result<CallbackOutcome, WorkflowError> {
        let now = now_millis();

        // 1. Claim: atomic read-and-delete.
        let session = match confirmation_session::claim(&self.pool, event.order_id).await {
            Ok(s) => s,
            Err(e) => {
                // Nothing consumed yet; a retry from the customer is safe.
                self.answer(&event.callback_id, messages::ALERT_FAILURE, true)
                    .await;
                return Err(WorkflowError::Claim(e));
            }
        };

        // 2. Absent session: expected, not an error.
        let Some(session) = session else {
            self.answer(
                &event.callback_id,
                messages::ALERT_EXPIRED_OR_HANDLED,
                true,
            )
            .await;
            return Ok(CallbackOutcome::AlreadyHandledOrExpired);
        };

        // 3. Claimed but stale: lazy expiry. The claim already removed the
        //    row, so repeats of this callback land in branch 2.
        if session.is_expired(now) {
            tracing::info!(
                order_id = event.order_id,
                expired_at = session.expires_at,
                "Confirmation session expired; order left pending"
            );
            self.answer(
                &event.callback_id,
                messages::ALERT_EXPIRED_OR_HANDLED,
                true,
            )
            .await;
            return Ok(CallbackOutcome::Expired);
        }

        // 4. Guarded order mutation.
        let mutated = match event.action {
            CallbackAction::Confirm => order::confirm(&self.pool, event.order_id, now).await,
            CallbackAction::Cancel => order::cancel(&self.pool, event.order_id, now).await,
        };

        let mutated = match mutated {
            Ok(m) => m,
            Err(e) => {
                // Fatal class: the session is gone, so no retry path exists.
                tracing::error!(
                    order_id = event.order_id,
                    action = ?event.action,
                    error = %e,
                    "Order write failed after session claim; manual reconciliation required"
                );
                self.answer(&event.callback_id, messages::ALERT_FAILURE, true)
                    .await;
                return Err(WorkflowError::Persistence(e));
            }
        };

        if !mutated {
            tracing::warn!(
                order_id = event.order_id,
                action = ?event.action,
                "Order no longer pending at mutation time despite claimed session"
            );
            self.answer(&event.callback_id, messages::ALERT_FAILURE, true)
                .await;
            return Ok(CallbackOutcome::GuardRejected);
        }

        // 5. Acknowledge right after the commit: the mutation is a local
        //    write, the sends below are network calls. The platform's
        //    loading spinner stops here.
        let ack = match event.action {
            CallbackAction::Confirm => messages::ACK_CONFIRMED,
            CallbackAction::Cancel => messages::ACK_CANCELLED,
        };
        self.answer(&event.callback_id, ack, false).await;

        // 6. Post-commit side effects, each best-effort: the order's
        //    authoritative state is the database row, not a delivery.
        if let Err(e) = self
            .notifier
            .edit_message_buttons(
                &event.chat_id,
                event.message_id,
                InlineKeyboardMarkup::empty(),
            )
            .await
        {
            tracing::warn!(order_id = event.order_id, error = %e, "Failed to strip prompt buttons");
        }

        match event.action {
            CallbackAction::Confirm => {
                self.send_to(
                    &session.chat_id,
                    &messages::order_confirmed(&session.order_number, session.total_amount),
                    event.order_id,
                )
                .await;
                if let Some(admin) = &self.admin_chat_id {
                    self.send_to(
                        admin,
                        &messages::admin_order_confirmed(
                            &session.order_number,
                            session.total_amount,
                        ),
                        event.order_id,
                    )
                    .await;
                }
                tracing::info!(order_id = event.order_id, "Order confirmed by customer");
                Ok(CallbackOutcome::Confirmed)
            }
            CallbackAction::Cancel => {
                self.send_to(
                    &session.chat_id,
                    &messages::order_cancelled(&session.order_number),
                    event.order_id,
                )
                .await;
                tracing::info!(order_id = event.order_id, "Order cancelled by customer");
                Ok(CallbackOutcome::Cancelled)
            }
        }
    }

    /// Lazy cleanup of sessions past their TTL; the affected orders stay
    /// `pending` and surface in the admin table for manual follow-up.
    pub async fn sweep_expired(&self) -> Result<u64, RepoError> {
        confirmation_session::sweep_expired(&self.pool, now_millis()).await
    }

    /// Answer a callback query, best-effort. The platform gives up on the
    /// query after its own timeout anyway; a failed answer must never mask
    /// the workflow outcome.
    async fn answer(&self, callback_id: &str, text: &str, show_alert: bool) {
        if let Err(e) = self
            .notifier
            .answer_callback(callback_id, text, show_alert)
            .await
        {
            tracing::warn!(error = %e, "Failed to answer callback query");
        }
    }

    async fn send_to(&self, chat_id: &str, text: &str, order_id: i64) {
        if let Err(e) = self.notifier.send_message(chat_id, text).await {
            tracing::warn!(order_id, error = %e, "Notification send failed");
        }
    }
}
