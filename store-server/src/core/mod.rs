//! Core Module
//!
//! 配置、状态与服务器生命周期

pub mod config;
pub mod server;
pub mod state;

pub use config::Config;
pub use server::Server;
pub use state::ServerState;
