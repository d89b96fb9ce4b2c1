use catalog_common::retry::RetryPolicy;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// Upper bound on insert attempts when a generated slug or SKU collides.
    pub identity_max_attempts: u8,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// Insert the default category tree on startup.
    pub seed_default_categories: bool,
}

impl CatalogConfig {
    pub fn identity_retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.identity_max_attempts,
            base_delay_ms: self.retry_base_delay_ms,
            max_delay_ms: self.retry_max_delay_ms,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            identity_max_attempts: retry.max_attempts,
            retry_base_delay_ms: retry.base_delay_ms,
            retry_max_delay_ms: retry.max_delay_ms,
            seed_default_categories: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationConfig {
    /// Announce new products and stores.
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub catalog: CatalogConfig,
    pub notification: NotificationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = CatalogConfig::default();
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default(
                "catalog.identity_max_attempts",
                defaults.identity_max_attempts as i64,
            )?
            .set_default(
                "catalog.retry_base_delay_ms",
                defaults.retry_base_delay_ms as i64,
            )?
            .set_default(
                "catalog.retry_max_delay_ms",
                defaults.retry_max_delay_ms as i64,
            )?
            .set_default(
                "catalog.seed_default_categories",
                defaults.seed_default_categories,
            )?
            .set_default("notification.enabled", true)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., MARKETPLACE__DATABASE__URL)
            .add_source(Environment::with_prefix("MARKETPLACE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
