use std::env;

/// Default upload limit: 16 MiB
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address to bind (127.0.0.1 for localhost, 0.0.0.0 for LAN)
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Debug-level logging
    pub debug: bool,
    /// Maximum upload body size in bytes
    pub max_upload_size: usize,
    /// Origins allowed to call the API from a browser (comma-separated in env var)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            debug: false,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables (and `.env`, if present)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidPort(v))?,
            None => defaults.port,
        };

        let max_upload_size = match lookup("MAX_UPLOAD_SIZE") {
            Some(v) => parse_upload_size(&v)?,
            None => defaults.max_upload_size,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port,
            debug: lookup("DEBUG")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.debug),
            max_upload_size,
            cors_origins: lookup("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
        })
    }

    /// Get the full bind address (host:port)
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Default tracing filter for this configuration
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "voltfilter_server=debug,voltfilter_rs=debug,tower_http=debug"
        } else {
            "voltfilter_server=info,voltfilter_rs=info,tower_http=debug"
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

pub fn parse_upload_size(value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidValue(format!(
            "MAX_UPLOAD_SIZE must be a positive number of bytes, got '{}'",
            value
        ))),
        Ok(size) => Ok(size),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(String),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}
