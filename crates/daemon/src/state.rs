use std::{fs, path::PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use common::ids;
use common::prelude::RateLimitConfig;

use crate::service_config::DEFAULT_MAX_UPLOAD_SIZE;

pub const APP_NAME: &str = "feedback";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DB_FILE_NAME: &str = "db.sqlite";
pub const UPLOADS_DIR_NAME: &str = "uploads";

/// Length of a generated admin token
pub const ADMIN_TOKEN_LEN: usize = 32;
/// Bytes of generated session signing secret
pub const SESSION_SECRET_LEN: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Port for the HTTP server
    #[serde(default = "default_port")]
    pub port: u16,
    /// Interface the HTTP server binds to
    #[serde(default = "default_host")]
    pub host: String,
    /// Secret path segment for the admin surface
    pub admin_token: String,
    /// Base64 encoded secret used to sign visitor cookies
    #[serde(default)]
    pub session_secret: Option<String>,
    /// Largest accepted request body in bytes
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,
    /// Mark visitor cookies `Secure` (enable behind TLS)
    #[serde(default)]
    pub secure_cookies: bool,
    /// Comments accepted per second across the whole service
    #[serde(default = "default_comment_rate")]
    pub comment_rate_per_sec: f64,
    /// Comments accepted back to back before the rate applies
    #[serde(default = "default_comment_burst")]
    pub comment_burst: u32,
}

fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_max_upload_size() -> usize {
    DEFAULT_MAX_UPLOAD_SIZE
}

fn default_comment_rate() -> f64 {
    RateLimitConfig::default().rate_per_sec
}

fn default_comment_burst() -> u32 {
    RateLimitConfig::default().burst
}

impl AppConfig {
    /// Fresh config with a new admin token and session secret
    pub fn generate() -> Result<Self, StateError> {
        let admin_token = ids::generate(ADMIN_TOKEN_LEN)?;

        let mut secret = [0u8; SESSION_SECRET_LEN];
        ids::fill_random(&mut secret)?;

        Ok(Self {
            port: default_port(),
            host: default_host(),
            admin_token,
            session_secret: Some(STANDARD.encode(secret)),
            max_upload_size: default_max_upload_size(),
            secure_cookies: false,
            comment_rate_per_sec: default_comment_rate(),
            comment_burst: default_comment_burst(),
        })
    }

    pub fn comment_rate(&self) -> RateLimitConfig {
        RateLimitConfig {
            rate_per_sec: self.comment_rate_per_sec,
            burst: self.comment_burst,
        }
    }

    /// Decoded session secret, if one is configured
    pub fn session_secret_bytes(&self) -> Result<Option<Vec<u8>>, StateError> {
        self.session_secret
            .as_deref()
            .map(|s| {
                STANDARD
                    .decode(s.trim())
                    .map_err(|e| StateError::InvalidSessionSecret(e.to_string()))
            })
            .transpose()
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the feedback directory (~/.feedback)
    pub app_dir: PathBuf,
    /// Path to the SQLite database
    pub db_path: PathBuf,
    /// Path to the uploads directory
    pub uploads_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the feedback directory path (custom or default ~/.feedback)
    pub fn app_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new feedback state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let app_dir = Self::app_dir(custom_path)?;

        if app_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&app_dir)?;

        let uploads_path = app_dir.join(UPLOADS_DIR_NAME);
        fs::create_dir_all(&uploads_path)?;

        let config = match config {
            Some(config) => config,
            None => AppConfig::generate()?,
        };
        let config_path = app_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;
        restrict_permissions(&config_path)?;

        // Create empty database (just touch the file, it will be initialized by the service)
        let db_path = app_dir.join(DB_FILE_NAME);
        fs::write(&db_path, "")?;

        Ok(Self {
            app_dir,
            db_path,
            uploads_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the feedback directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let app_dir = Self::app_dir(custom_path)?;

        if !app_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let db_path = app_dir.join(DB_FILE_NAME);
        let uploads_path = app_dir.join(UPLOADS_DIR_NAME);
        let config_path = app_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }
        if !uploads_path.exists() {
            return Err(StateError::MissingFile(format!("{}/", UPLOADS_DIR_NAME)));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            app_dir,
            db_path,
            uploads_path,
            config_path,
            config,
        })
    }
}

// the config file holds the admin token
#[cfg(unix)]
fn restrict_permissions(path: &std::path::Path) -> Result<(), StateError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &std::path::Path) -> Result<(), StateError> {
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("feedback directory not initialized. Run 'feedback init' first")]
    NotInitialized,

    #[error("feedback directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid session secret: {0}")]
    InvalidSessionSecret(String),

    #[error("random source error: {0}")]
    Random(#[from] ids::IdError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
