//! Utilities

pub mod error;
pub mod logger;
pub mod result;

pub use error::{AppError, AppResponse, ok};
pub use result::AppResult;
