use std::net::{IpAddr, SocketAddr};

use clap::Args;

use feedback_daemon::state::AppState;
use feedback_daemon::uploads::UploadsConfig;
use feedback_daemon::{spawn_service, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Daemon {
    /// Override HTTP port (default from config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Override the admin token (default from config)
    #[arg(long, env = "FEEDBACK_ADMIN_TOKEN", hide_env_values = true)]
    pub admin_token: Option<String>,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("state error: {0}")]
    StateError(#[from] feedback_daemon::state::StateError),

    #[error("invalid listen host '{0}'")]
    InvalidHost(String),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Daemon {
    type Error = DaemonError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Load state from config path (or default ~/.feedback)
        let state = AppState::load(ctx.config_path.clone())?;
        let app_config = &state.config;

        let host: IpAddr = app_config
            .host
            .parse()
            .map_err(|_| DaemonError::InvalidHost(app_config.host.clone()))?;
        let port = self.port.unwrap_or(app_config.port);

        let config = ServiceConfig {
            listen_addr: SocketAddr::new(host, port),
            max_upload_size: app_config.max_upload_size,
            admin_token: self
                .admin_token
                .clone()
                .unwrap_or_else(|| app_config.admin_token.clone()),
            session_secret: app_config.session_secret_bytes()?,
            secure_cookies: app_config.secure_cookies,
            comment_rate: app_config.comment_rate(),
            sqlite_path: Some(state.db_path.clone()),
            uploads: UploadsConfig::Local {
                path: state.uploads_path.clone(),
            },
            log_level: tracing::Level::INFO,
            log_dir: self.log_dir.clone(),
        };

        spawn_service(&config).await;
        Ok("daemon ended".to_string())
    }
}
