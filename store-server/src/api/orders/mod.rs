//! Order API Module
//!
//! Checkout hands the finished cart to `create`; the confirmation workflow
//! (or the admin notification, for guests without a linked chat) starts from
//! there. Reads back the admin order table.

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/orders", routes())
        // axum 0.8 no longer redirects the trailing-slash form to the nested
        // root, so serve the collection at `/api/orders/` explicitly too.
        .route("/api/orders/", post(handler::create).get(handler::list))
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", patch(handler::update_status))
}
