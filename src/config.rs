use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Payment provider settings. The access token authenticates outbound
/// calls; the webhook secret, when set, enables signature verification
/// on inbound notifications.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub base_url: String,
    pub access_token: String,
    #[serde(default)]
    pub webhook_secret: Option<String>,
    #[serde(default = "default_gateway_timeout")]
    pub timeout_seconds: u64,
}

fn default_gateway_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration: i64,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub auto_migrate: bool,
    pub gateway: GatewayConfig,
}

fn default_jwt_expiration() -> i64 {
    7 * 24 * 3600
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.is_empty() {
            return Err(ConfigError::Message("database_url must be set".into()));
        }
        if self.jwt_secret.len() < 32 {
            return Err(ConfigError::Message(
                "jwt_secret must be at least 32 characters".into(),
            ));
        }
        if self.is_production() && self.gateway.webhook_secret.is_none() {
            return Err(ConfigError::Message(
                "gateway.webhook_secret is required in production".into(),
            ));
        }
        Ok(())
    }
}

/// Loads configuration from layered sources, later layers winning:
/// config/default.toml, config/{environment}.toml, then APP__* env vars
/// (e.g. APP__GATEWAY__ACCESS_TOKEN).
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

    let config: AppConfig = Config::builder()
        .add_source(File::with_name("config/default"))
        .add_source(File::with_name(&format!("config/{}", environment)).required(false))
        .set_override("environment", environment)?
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?
        .try_deserialize()?;

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            jwt_expiration: default_jwt_expiration(),
            host: default_host(),
            port: default_port(),
            environment: "development".to_string(),
            log_level: default_log_level(),
            auto_migrate: true,
            gateway: GatewayConfig {
                base_url: "https://api.example.com".to_string(),
                access_token: "test-token".to_string(),
                webhook_secret: None,
                timeout_seconds: default_gateway_timeout(),
            },
        }
    }

    #[test]
    fn short_jwt_secret_is_rejected() {
        let mut config = base_config();
        config.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn production_requires_webhook_secret() {
        let mut config = base_config();
        config.environment = "production".to_string();
        assert!(config.validate().is_err());

        config.gateway.webhook_secret = Some("whsec".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn development_config_is_valid() {
        assert!(base_config().validate().is_ok());
    }
}
