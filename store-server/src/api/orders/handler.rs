//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::confirmation::WorkflowError;
use crate::core::ServerState;
use crate::db::repository::order;
use crate::telegram::messages;
use crate::utils::{AppError, AppResult};
use shared::models::{Order, OrderCreate, OrderItem, OrderItemCreate, OrderStatus};

/// Query params for listing orders
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Checkout payload
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "order_number is required"))]
    pub order_number: String,
    pub user_id: Option<String>,
    #[validate(email(message = "guest_email must be a valid email"))]
    pub guest_email: Option<String>,
    #[validate(range(min = 0.0, message = "total_amount must not be negative"))]
    pub total_amount: f64,
    #[validate(length(min = 1, message = "customer_name is required"))]
    pub customer_name: String,
    #[validate(length(min = 6, message = "customer_phone is required"))]
    pub customer_phone: String,
    #[validate(length(min = 1, message = "customer_address is required"))]
    pub customer_address: String,
    #[validate(length(min = 1, message = "customer_city is required"))]
    pub customer_city: String,
    pub customer_zip: Option<String>,
    pub notes: Option<String>,
    /// When present, the confirmation prompt goes to this chat
    pub telegram_chat_id: Option<String>,
    #[validate(length(min = 1, message = "order must contain at least one item"))]
    pub items: Vec<CreateOrderItem>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateOrderItem {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// Whether a confirmation prompt was sent for this order
    pub confirmation_requested: bool,
}

/// Create an order from a finished checkout.
///
/// With a `telegram_chat_id`, the confirmation workflow starts (session +
/// prompt with confirm/cancel buttons). Without one (the guest flow) the
/// admin channel gets the new-order notification instead, and the order
/// waits in `pending` for manual handling.
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<OrderResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let chat_id = payload.telegram_chat_id.clone();
    let data = OrderCreate {
        order_number: payload.order_number,
        user_id: payload.user_id,
        guest_email: payload.guest_email,
        total_amount: payload.total_amount,
        customer_name: payload.customer_name,
        customer_phone: payload.customer_phone,
        customer_address: payload.customer_address,
        customer_city: payload.customer_city,
        customer_zip: payload.customer_zip,
        notes: payload.notes,
        items: payload
            .items
            .into_iter()
            .map(|i| OrderItemCreate {
                product_id: i.product_id,
                name: i.name,
                quantity: i.quantity,
                price: i.price,
            })
            .collect(),
    };

    let order = order::create(&state.pool, data).await?;
    let items = order::find_items(&state.pool, order.id).await?;

    let confirmation_requested = match &chat_id {
        Some(chat_id) => match state.confirmation.begin(&order, chat_id).await {
            Ok(()) => true,
            Err(WorkflowError::AlreadyPending(_)) => {
                // Only reachable if the order id collided, which create()
                // already rules out; treat as already-requested.
                true
            }
            Err(e) => {
                // Order is durable; a missing prompt is recoverable by
                // support. Same policy as every notification: never fail
                // the order for messaging trouble.
                tracing::error!(order_id = order.id, error = %e, "Failed to start confirmation");
                false
            }
        },
        None => {
            notify_admin_new_order(&state, &order, &items).await;
            false
        }
    };

    Ok(Json(OrderResponse {
        order,
        items,
        confirmation_requested,
    }))
}

/// List all orders (paginated, newest first)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = order::find_all(&state.pool, query.limit, query.offset).await?;
    Ok(Json(orders))
}

/// Get order by id, including its lines
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderResponse>> {
    let order = order::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))?;
    let items = order::find_items(&state.pool, id).await?;
    Ok(Json(OrderResponse {
        order,
        items,
        confirmation_requested: false,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Admin fulfillment transition (forward-only; see the repository guards)
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<Order>> {
    let now = shared::util::now_millis();
    let moved = order::update_status(&state.pool, id, payload.status, now).await?;
    if !moved {
        return Err(AppError::BusinessRule(format!(
            "Order {} cannot move to {}",
            id, payload.status
        )));
    }

    let order = order::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))?;
    Ok(Json(order))
}

/// Guest checkout: no customer chat to prompt, so the admin channel gets
/// the full new-order summary (best-effort, never fails the order).
async fn notify_admin_new_order(state: &ServerState, order: &Order, items: &[OrderItem]) {
    let Some(admin_chat_id) = &state.config.telegram_admin_chat_id else {
        tracing::warn!("TELEGRAM_ADMIN_CHAT_ID not configured, skipping notification");
        return;
    };

    let text = messages::new_order(order, items);
    if let Err(e) = state.notifier.send_message(admin_chat_id, &text).await {
        tracing::error!(order_id = order.id, error = %e, "Failed to send admin notification");
    }
}
