use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use url::Url;

use common::prelude::RateLimiter;

use crate::database::{Database, DatabaseSetupError};
use crate::identity::{self, IdentityError};
use crate::service_config::Config;
use crate::share_manager::ShareManager;
use crate::uploads::{Uploads, UploadsError};

/// Main service state - everything a request handler can reach
#[derive(Clone)]
pub struct State {
    database: Database,
    shares: ShareManager,
    admin_token: Arc<str>,
    session_key: Key,
    secure_cookies: bool,
}

impl State {
    pub async fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        if config.admin_token.trim().is_empty() {
            return Err(StateSetupError::MissingAdminToken);
        }

        // 1. Setup database
        let sqlite_database_url = match config.sqlite_path {
            Some(ref path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        return Err(StateSetupError::DatabasePathDoesNotExist);
                    }
                }
                Url::parse(&format!("sqlite://{}", path.display()))
                    .map_err(|_| StateSetupError::InvalidDatabaseUrl)
            }
            // otherwise just set up an in-memory database
            None => Url::parse("sqlite::memory:").map_err(|_| StateSetupError::InvalidDatabaseUrl),
        }?;
        tracing::info!("Database URL: {:?}", sqlite_database_url);
        let database = Database::connect(&sqlite_database_url).await?;

        // 2. Setup upload storage
        let uploads = Uploads::new(&config.uploads).await?;
        tracing::info!(uploads = ?config.uploads, "upload storage ready");

        // 3. Setup visitor session signing
        let session_key = identity::session_key(config.session_secret.as_deref())?;

        // 4. Wire the share manager with the one comment limiter
        let limiter = Arc::new(RateLimiter::new(config.comment_rate));
        let shares = ShareManager::new(database.clone(), uploads, limiter);

        Ok(Self {
            database,
            shares,
            admin_token: Arc::from(config.admin_token.as_str()),
            session_key,
            secure_cookies: config.secure_cookies,
        })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn shares(&self) -> &ShareManager {
        &self.shares
    }

    /// Exact match against the configured admin token
    pub fn is_admin_token(&self, candidate: &str) -> bool {
        candidate == &*self.admin_token
    }

    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }
}

impl FromRef<State> for Key {
    fn from_ref(state: &State) -> Self {
        state.session_key.clone()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("an admin token must be configured")]
    MissingAdminToken,

    #[error("Database path does not exist")]
    DatabasePathDoesNotExist,

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("failure to setup the database: {0}")]
    DatabaseSetupError(#[from] DatabaseSetupError),

    #[error("failure to setup upload storage: {0}")]
    UploadsSetupError(#[from] UploadsError),

    #[error("failure to setup session signing: {0}")]
    SessionKeyError(#[from] IdentityError),
}
