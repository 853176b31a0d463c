//! Server Implementation
//!
//! HTTP 服务器启动和管理

use crate::core::{Config, ServerState};
use crate::telegram::TelegramClient;
use crate::utils::AppError;

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (for tests sharing a pool)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> Result<(), AppError> {
        // Create application state if not provided
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await,
        };

        // Start background tasks
        state.start_background_tasks().await;

        // Register the Telegram webhook when a public domain is configured.
        // Failure is logged, not fatal: the operator can re-run registration
        // out-of-band while the server keeps serving.
        if let Some(domain) = &self.config.telegram_webhook_domain {
            let client = TelegramClient::new(
                self.config.telegram_api_base.clone(),
                self.config.telegram_bot_token.clone(),
            );
            if let Err(e) = client.set_webhook(domain).await {
                tracing::error!(domain = %domain, error = %e, "❌ Telegram webhook registration failed");
            }
        }

        let app = crate::api::build_app(&state).with_state(state);

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        tracing::info!("🛍️ Souk store server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
            })
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

        Ok(())
    }
}
