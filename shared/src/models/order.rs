//! Order Model

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Created `Pending` at checkout. Moves to `Confirmed` or `Cancelled` only
/// through the confirmation workflow (or a guarded admin cancellation while
/// still pending); fulfillment states are advanced by the admin afterwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Stable storage / wire form (matches the serde casing)
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Order entity (订单)
///
/// `confirmed_at` and `cancelled_at` are mutually exclusive and write-once;
/// both mutations are guarded on `status = pending` in the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    /// Human-facing receipt number (e.g. "CMD-20250807-0012")
    pub order_number: String,
    /// External account id when the customer was signed in
    pub user_id: Option<String>,
    /// Contact for guest checkout
    pub guest_email: Option<String>,
    pub status: OrderStatus,
    /// Always "cod" in this storefront
    pub payment_method: String,
    pub total_amount: f64,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub customer_city: String,
    pub customer_zip: Option<String>,
    pub notes: Option<String>,
    pub confirmed_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    /// Opaque catalog id (the catalog itself lives in an external service)
    pub product_id: String,
    /// Product name snapshotted at checkout so notifications stay
    /// self-consistent even if the catalog changes
    pub name: String,
    pub quantity: i64,
    pub price: f64,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub order_number: String,
    pub user_id: Option<String>,
    pub guest_email: Option<String>,
    pub total_amount: f64,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub customer_city: String,
    pub customer_zip: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderItemCreate>,
}

/// Create order line payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemCreate {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
}
