use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Longest accepted session window: one year.
pub const MAX_WINDOW_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub mongodb: MongoDbConfig,
    #[serde(default)]
    pub session: SessionConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoDbConfig {
    pub database: String,
    #[serde(default = "default_threads_collection")]
    pub threads_collection: String,
    #[serde(default = "default_users_collection")]
    pub users_collection: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Idle time after which the next interaction starts a new thread
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window_hours: default_window_hours(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_threads_collection() -> String {
    "assistant_threads".to_string()
}

fn default_users_collection() -> String {
    "users".to_string()
}

fn default_window_hours() -> i64 {
    24
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables prefixed with DEALFLOW, sections split by `__`
    ///    (e.g. DEALFLOW_SERVER__PORT, DEALFLOW_SESSION__WINDOW_HOURS)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            // 1. Load default config
            .add_source(File::with_name("config/default").required(false))
            // 2. Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // 3. Environment variables override everything
            .add_source(
                Environment::with_prefix("DEALFLOW")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
            );

        let config = builder.build()?;

        let mut cfg: Config = config.try_deserialize()?;

        // Load secrets from ENV (not in TOML)
        cfg.mongodb_uri = std::env::var("MONGODB_URI")
            .map_err(|_| ConfigError::Message("MONGODB_URI environment variable is required".to_string()))?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder()
            .add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        let cfg: Config = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let hours = self.session.window_hours;
        if hours <= 0 || hours > MAX_WINDOW_HOURS {
            return Err(ConfigError::Message(format!(
                "session.window_hours must be between 1 and {}, got {}",
                MAX_WINDOW_HOURS, hours
            )));
        }
        Ok(())
    }
}
