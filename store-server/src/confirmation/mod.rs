//! Out-of-band order confirmation workflow
//!
//! A cash-on-delivery order gets a time-limited confirmation prompt in the
//! customer's Telegram chat; the button press comes back as a webhook
//! callback that may be duplicated, late, or racing its opposite. The
//! engine resolves all of that against the durable session row: an atomic
//! claim acts as the fencing token, so every order reaches exactly one
//! terminal state with exactly one set of side effects.

mod engine;

pub use engine::{
    CallbackAction, CallbackEvent, CallbackOutcome, ConfirmationService, WorkflowError,
};
