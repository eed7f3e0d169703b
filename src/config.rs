use anyhow::Result;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub schedule_api_url: String,
    pub client_base_url: String,
    pub employee_cache_ttl_secs: u64,
    pub editor_idle_timeout_secs: u64,
    pub default_locale: String,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_env_only()
    }

    /// Load configuration from environment variables only (without loading .env files)
    pub fn from_env_only() -> Result<Self> {
        let schedule_api_url = var_or("SCHEDULE_API_URL", "http://localhost:5000/api");
        if !schedule_api_url.starts_with("http://") && !schedule_api_url.starts_with("https://") {
            anyhow::bail!("SCHEDULE_API_URL must be an http(s) URL, got {}", schedule_api_url);
        }

        Ok(Config {
            host: var_or("HOST", "127.0.0.1"),
            port: parsed_or("PORT", 8080),
            environment: var_or("ENVIRONMENT", "development"),
            schedule_api_url,
            client_base_url: var_or("CLIENT_BASE_URL", "http://localhost:3000"),
            employee_cache_ttl_secs: parsed_or("EMPLOYEE_CACHE_TTL_SECS", 300),
            editor_idle_timeout_secs: parsed_or("EDITOR_IDLE_TIMEOUT_SECS", 3600),
            default_locale: var_or("DEFAULT_LOCALE", "en"),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn employee_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.employee_cache_ttl_secs)
    }

    pub fn editor_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.editor_idle_timeout_secs)
    }
}
