use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::billing::{PlanCatalog, PlanId, PortalRateLimitConfig};
use crate::utils::get_env_with_prefix;

/// Main configuration for an Executry application
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub billing: BillingConfig,
    pub health: HealthConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingConfig {
    /// Webhook signing secret. Loaded from the environment only and never
    /// serialized.
    #[serde(skip)]
    pub webhook_secret: Option<SecretString>,
    /// Provider price ids that resolve to the Pro plan.
    #[serde(default)]
    pub pro_price_ids: Vec<String>,
    #[serde(default)]
    pub portal: PortalRateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthConfig {
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            billing: BillingConfig::default(),
            health: HealthConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            webhook_secret: None,
            pro_price_ids: Vec::new(),
            portal: PortalRateLimitConfig::default(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

fn default_health_enabled() -> bool {
    true
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

impl BillingConfig {
    /// Build the price catalog from the configured Pro price ids.
    #[must_use]
    pub fn catalog(&self) -> PlanCatalog {
        let mut catalog = PlanCatalog::new();
        for price_id in &self.pro_price_ids {
            catalog = catalog.with_price(price_id.clone(), PlanId::Pro);
        }
        catalog
    }
}

/// Builder for Config with environment variable support
///
/// # Example
///
/// ```rust
/// use executry::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .with_port(9000)
///     .with_log_level("debug")
///     .build()
///     .unwrap();
/// assert_eq!(config.server.port, 9000);
/// ```
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<SecretString>) -> Self {
        self.config.billing.webhook_secret = Some(secret.into());
        self
    }

    /// Register a provider price id that resolves to the Pro plan
    pub fn with_pro_price_id(mut self, price_id: impl Into<String>) -> Self {
        self.config.billing.pro_price_ids.push(price_id.into());
        self
    }

    pub fn with_portal_rate_limit(mut self, portal: PortalRateLimitConfig) -> Self {
        self.config.billing.portal = portal;
        self
    }

    pub fn with_health_enabled(mut self, enabled: bool) -> Self {
        self.config.health.enabled = enabled;
        self
    }

    /// Load configuration from environment variables with EXECUTRY_ prefix
    pub fn from_env(mut self) -> Self {
        if let Some(host) = get_env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        // Check EXECUTRY_PORT first, fall back to PORT (for Railway/Heroku compatibility)
        if let Some(port) = get_env_with_prefix("PORT") {
            if let Ok(p) = port.parse() {
                self.config.server.port = p;
            }
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }

        if let Some(secret) = get_env_with_prefix("WEBHOOK_SECRET") {
            self.config.billing.webhook_secret = Some(SecretString::from(secret));
        }
        // Comma-separated list of provider price ids for the Pro plan
        if let Some(price_ids) = get_env_with_prefix("PRO_PRICE_IDS") {
            self.config.billing.pro_price_ids = price_ids
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(max_sessions) = get_env_with_prefix("PORTAL_MAX_SESSIONS") {
            if let Ok(max) = max_sessions.parse() {
                self.config.billing.portal.max_sessions = max;
            }
        }
        if let Some(window) = get_env_with_prefix("PORTAL_WINDOW_SECONDS") {
            if let Ok(secs) = window.parse() {
                self.config.billing.portal.window_seconds = secs;
            }
        }

        if let Some(enabled) = get_env_with_prefix("HEALTH_ENABLED") {
            self.config.health.enabled = enabled.parse().unwrap_or(true);
        }

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration is invalid:
    /// - Invalid server address (host:port)
    /// - Invalid log level
    /// - Invalid portal rate limit settings
    pub fn build(self) -> crate::error::Result<Config> {
        // Validate server address
        self.config.server.addr().map_err(|e| {
            crate::error::ExecutryError::bad_request(format!(
                "Invalid server address {}:{} - {}",
                self.config.server.host, self.config.server.port, e
            ))
        })?;

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(crate::error::ExecutryError::bad_request(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        // Validate port is in valid range
        if self.config.server.port == 0 {
            return Err(crate::error::ExecutryError::bad_request(
                "Server port must be greater than 0",
            ));
        }

        // Validate portal rate limit settings
        if self.config.billing.portal.max_sessions == 0 {
            return Err(crate::error::ExecutryError::bad_request(
                "Portal rate limit max_sessions must be greater than 0",
            ));
        }
        if self.config.billing.portal.window_seconds == 0 {
            return Err(crate::error::ExecutryError::bad_request(
                "Portal rate limit window_seconds must be greater than 0",
            ));
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert!(config.billing.webhook_secret.is_none());
        assert!(config.billing.pro_price_ids.is_empty());
        assert_eq!(config.billing.portal.max_sessions, 5);
        assert_eq!(config.billing.portal.window_seconds, 60);
        assert!(config.health.enabled);
    }

    #[test]
    fn test_builder_overrides() {
        let config = ConfigBuilder::new()
            .with_host("127.0.0.1")
            .with_port(3000)
            .with_log_level("debug")
            .with_json_logging(true)
            .with_webhook_secret("whsec_test")
            .with_pro_price_id("price_pro_monthly")
            .with_pro_price_id("price_pro_yearly")
            .with_health_enabled(false)
            .build()
            .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(
            config.billing.webhook_secret.unwrap().expose_secret(),
            "whsec_test"
        );
        assert_eq!(config.billing.pro_price_ids.len(), 2);
        assert!(!config.health.enabled);
    }

    #[test]
    fn test_catalog_maps_pro_prices() {
        let config = ConfigBuilder::new()
            .with_pro_price_id("price_pro_monthly")
            .with_pro_price_id("price_pro_yearly")
            .build()
            .unwrap();

        let catalog = config.billing.catalog();
        assert_eq!(catalog.plan_for_price("price_pro_monthly"), Some(PlanId::Pro));
        assert_eq!(catalog.plan_for_price("price_pro_yearly"), Some(PlanId::Pro));
        assert_eq!(catalog.plan_for_price("price_unknown"), None);
    }

    #[test]
    fn test_build_rejects_invalid_log_level() {
        let result = ConfigBuilder::new().with_log_level("verbose").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_build_rejects_zero_port() {
        let result = ConfigBuilder::new().with_port(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_build_rejects_zero_portal_window() {
        let result = ConfigBuilder::new()
            .with_portal_rate_limit(PortalRateLimitConfig {
                max_sessions: 5,
                window_seconds: 0,
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_from_env_reads_prefixed_values() {
        unsafe {
            std::env::set_var("EXECUTRY_LOG_LEVEL", "warn");
            std::env::set_var("EXECUTRY_PRO_PRICE_IDS", "price_a, price_b,");
        }

        let config = ConfigBuilder::new().from_env().build().unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.billing.pro_price_ids, vec!["price_a", "price_b"]);

        unsafe {
            std::env::remove_var("EXECUTRY_LOG_LEVEL");
            std::env::remove_var("EXECUTRY_PRO_PRICE_IDS");
        }
    }
}
