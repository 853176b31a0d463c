//! Souk Store Server - 摩洛哥零售店面后端
//!
//! # 架构概述
//!
//! 店面的绝大部分功能（商品目录、购物车、后台管理界面、认证、图片）由
//! 外部服务承担；本服务承载的是真正需要状态机与并发正确性的部分 ——
//! 货到付款订单的 Telegram 确认工作流。
//!
//! # 模块结构
//!
//! ```text
//! store-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── api/           # HTTP 路由和处理器 (orders / telegram webhook / health)
//! ├── confirmation/  # 确认工作流引擎 (状态机 + fencing-token claim)
//! ├── telegram/      # Bot API 适配器与消息模板
//! ├── db/            # 数据库层 (SQLite + 仓储)
//! └── utils/         # 错误、日志、Result 别名
//! ```

pub mod api;
pub mod confirmation;
pub mod core;
pub mod db;
pub mod telegram;
pub mod utils;

// Re-export 公共类型
pub use confirmation::{CallbackAction, CallbackEvent, CallbackOutcome, ConfirmationService};
pub use core::{Config, Server, ServerState};
pub use db::DbService;
pub use telegram::{Notifier, TelegramClient};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
   _____             __
  / ___/____  __  __/ /__
  \__ \/ __ \/ / / / //_/
 ___/ / /_/ / /_/ / ,<
/____/\____/\__,_/_/|_|

Souk Store Server v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// 设置环境 (dotenv + 日志)
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    // .env 不存在不算错误
    let _ = dotenv::dotenv();

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}
