//! Shared domain types for the souk workspace.
//!
//! 模型与工具函数，供 store-server 及后续管理端共用：
//!
//! - **models**: 订单、订单行、确认会话
//! - **util**: 时间戳与 snowflake ID

pub mod models;
pub mod util;

pub use models::{
    ConfirmationSession, Order, OrderCreate, OrderItem, OrderItemCreate, OrderStatus,
};
