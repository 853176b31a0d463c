use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::confirmation::ConfirmationService;
use crate::core::Config;
use crate::db::DbService;
use crate::telegram::{Notifier, TelegramClient};

/// 服务器状态 - 持有所有服务的共享引用
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | 数据库连接池 |
/// | notifier | Arc<dyn Notifier> | Telegram 适配器 (进程启动时注入) |
/// | confirmation | ConfirmationService | 确认工作流引擎 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 数据库连接池
    pub pool: SqlitePool,
    /// 消息平台适配器
    pub notifier: Arc<dyn Notifier>,
    /// 确认工作流引擎
    pub confirmation: ConfirmationService,
}

impl ServerState {
    /// 手动构造 (测试中与 [`initialize()`] 之外使用)
    pub fn new(
        config: Config,
        pool: SqlitePool,
        notifier: Arc<dyn Notifier>,
        confirmation: ConfirmationService,
    ) -> Self {
        Self {
            config,
            pool,
            notifier,
            confirmation,
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 数据库 (连接池 + 迁移)
    /// 2. Telegram 客户端 (单例，注入各服务)
    /// 3. 确认工作流引擎
    ///
    /// # Panics
    ///
    /// 数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        // 0. Ensure the database directory exists
        if let Some(parent) = std::path::Path::new(&config.database_path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).expect("Failed to create database directory");
        }

        // 1. Initialize DB
        let db_service = DbService::new(&config.database_path)
            .await
            .expect("Failed to initialize database");
        let pool = db_service.pool;

        // 2. One notifier instance for the whole process
        let notifier: Arc<dyn Notifier> = Arc::new(TelegramClient::new(
            config.telegram_api_base.clone(),
            config.telegram_bot_token.clone(),
        ));

        // 3. Workflow engine
        let confirmation = ConfirmationService::new(
            pool.clone(),
            notifier.clone(),
            config.telegram_admin_chat_id.clone(),
            config.confirmation_ttl_ms(),
        );

        Self::new(config.clone(), pool, notifier, confirmation)
    }

    /// 启动后台任务
    ///
    /// 目前只有一个定时任务：每小时清理过期确认会话。
    pub async fn start_background_tasks(&self) {
        let confirmation = self.confirmation.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(3600));
            // The first tick fires immediately, which doubles as a
            // startup cleanup of sessions left over from a previous run.
            loop {
                interval.tick().await;
                match confirmation.sweep_expired().await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!(count = n, "Swept expired confirmation sessions"),
                    Err(e) => tracing::warn!(error = %e, "Session sweep failed"),
                }
            }
        });
        tracing::info!("Background tasks started (session sweeper: hourly)");
    }
}
