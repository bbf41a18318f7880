use std::net::SocketAddr;

use crate::ServiceConfig;

#[derive(Debug, Clone)]
pub struct Config {
    // Listen address
    pub listen_addr: SocketAddr,
    // log level for http tracing
    pub log_level: tracing::Level,
    // cap on request bodies, uploads included
    pub max_upload_size: usize,
}

impl Config {
    pub fn new(listen_addr: SocketAddr, log_level: tracing::Level, max_upload_size: usize) -> Self {
        tracing::info!(
            "Creating HTTP server Config: listen_addr={}, log_level={}, max_upload_size={}",
            listen_addr,
            log_level,
            max_upload_size
        );
        Self {
            listen_addr,
            log_level,
            max_upload_size,
        }
    }
}

impl From<&ServiceConfig> for Config {
    fn from(config: &ServiceConfig) -> Self {
        Self::new(config.listen_addr, config.log_level, config.max_upload_size)
    }
}
