use std::env;
use std::time::Duration;

use crate::ratelimit::FailurePolicy;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub auth_jwt_secret: String,
    pub api_key_pepper: String,
    pub billing_webhook_secret: String,
    pub github_api_base: String,
    pub github_repo_name: String,
    pub rate_limit_failure_policy: FailurePolicy,
    pub subscription_cache_ttl_secs: u64,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn optional(name: &'static str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let policy_raw = optional("RATE_LIMIT_FAILURE_POLICY", "open");
        let rate_limit_failure_policy = FailurePolicy::parse(&policy_raw)
            .ok_or(ConfigError::Invalid("RATE_LIMIT_FAILURE_POLICY", policy_raw))?;

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            server_host: optional("SERVER_HOST", "::"),
            server_port: parsed("SERVER_PORT", 3000)?,
            api_base_uri: optional("API_BASE_URI", "/api"),
            auth_jwt_secret: required("AUTH_JWT_SECRET")?,
            api_key_pepper: required("API_KEY_PEPPER")?,
            billing_webhook_secret: required("BILLING_WEBHOOK_SECRET")?,
            github_api_base: optional("GITHUB_API_BASE", "https://api.github.com"),
            github_repo_name: optional("GITHUB_REPO_NAME", "bookmarksCollection"),
            rate_limit_failure_policy,
            subscription_cache_ttl_secs: parsed("SUBSCRIPTION_CACHE_TTL", 300)?,
        })
    }

    pub fn subscription_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.subscription_cache_ttl_secs)
    }
}
