/// 服务器配置 - 店面后端的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | DATABASE_PATH | data/souk.db | SQLite 数据库文件 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (无) | 日志文件目录（可选） |
/// | ENVIRONMENT | development | 运行环境 |
/// | TELEGRAM_BOT_TOKEN | (必填) | Bot 凭证 |
/// | TELEGRAM_API_BASE | https://api.telegram.org | Bot API 地址 |
/// | TELEGRAM_ADMIN_CHAT_ID | (无) | 管理员通知频道（可选） |
/// | TELEGRAM_WEBHOOK_DOMAIN | (无) | 启动时注册 webhook（可选） |
/// | CONFIRMATION_TTL_HOURS | 24 | 确认会话有效期 |
///
/// # 示例
///
/// ```ignore
/// DATABASE_PATH=/data/souk.db HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub http_port: u16,
    /// SQLite 数据库文件路径
    pub database_path: String,
    /// 日志级别
    pub log_level: String,
    /// 日志文件目录 (可选)
    pub log_dir: Option<String>,
    /// 运行环境: development | staging | production
    pub environment: String,

    // === Telegram ===
    /// Bot 凭证 (必填)
    pub telegram_bot_token: String,
    /// Bot API 地址 (测试时可指向本地 stub)
    pub telegram_api_base: String,
    /// 管理员通知频道 (可选，缺失时跳过管理员通知)
    pub telegram_admin_chat_id: Option<String>,
    /// 启动时注册 webhook 的域名 (可选)
    pub telegram_webhook_domain: Option<String>,

    /// 确认会话有效期 (小时)
    pub confirmation_ttl_hours: i64,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/souk.db".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),

            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            telegram_api_base: std::env::var("TELEGRAM_API_BASE")
                .unwrap_or_else(|_| "https://api.telegram.org".into()),
            telegram_admin_chat_id: std::env::var("TELEGRAM_ADMIN_CHAT_ID")
                .ok()
                .filter(|v| !v.is_empty()),
            telegram_webhook_domain: std::env::var("TELEGRAM_WEBHOOK_DOMAIN")
                .ok()
                .filter(|v| !v.is_empty()),

            confirmation_ttl_hours: std::env::var("CONFIRMATION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
        }
    }

    /// 确认会话有效期 (毫秒)
    pub fn confirmation_ttl_ms(&self) -> i64 {
        self.confirmation_ttl_hours * 60 * 60 * 1000
    }
}
