use std::net::SocketAddr;
use std::path::PathBuf;

use common::prelude::RateLimitConfig;

use crate::uploads::UploadsConfig;

/// Default cap on request bodies (50 MiB)
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// address the HTTP server binds to
    pub listen_addr: SocketAddr,
    /// largest request body accepted, uploads included
    pub max_upload_size: usize,

    // access
    /// secret path segment guarding the admin surface
    pub admin_token: String,
    /// key material for signing visitor cookies (at least 64 bytes),
    ///  if not set then an ephemeral key is generated
    pub session_secret: Option<Vec<u8>>,
    /// mark visitor cookies `Secure`
    pub secure_cookies: bool,
    /// process-wide budget for comment creation
    pub comment_rate: RateLimitConfig,

    // data store configuration
    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,
    /// where uploaded bytes are kept
    pub uploads: UploadsConfig,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Throwaway configuration: in-memory database and uploads,
    ///  ephemeral session key, default limits
    pub fn ephemeral(admin_token: impl Into<String>) -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            admin_token: admin_token.into(),
            session_secret: None,
            secure_cookies: false,
            comment_rate: RateLimitConfig::default(),
            sqlite_path: None,
            uploads: UploadsConfig::Memory,
            log_level: tracing::Level::INFO,
            log_dir: None,
        }
    }
}
