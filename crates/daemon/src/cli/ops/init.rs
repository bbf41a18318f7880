use clap::Args;

use feedback_daemon::state::{AppConfig, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// HTTP port to write into the new config
    #[arg(long)]
    pub port: Option<u16>,

    /// Use this admin token instead of generating one
    #[arg(long)]
    pub admin_token: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("admin token must not be empty")]
    EmptyAdminToken,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = AppConfig::generate()?;
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(token) = &self.admin_token {
            let token = token.trim();
            if token.is_empty() {
                return Err(InitError::EmptyAdminToken);
            }
            config.admin_token = token.to_string();
        }

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        Ok(format!(
            "Initialized feedback directory at {}\n  config:  {}\n  admin:   http://localhost:{}/admin/{}/",
            state.app_dir.display(),
            state.config_path.display(),
            state.config.port,
            state.config.admin_token,
        ))
    }
}
