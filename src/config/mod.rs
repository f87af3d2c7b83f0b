use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;

/// Configuration for the application
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Address the HTTP server listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Lifetime of an admin session token
    #[serde(default = "default_session_ttl_minutes")]
    pub session_ttl_minutes: i64,
    /// Labor rate seeded alongside the first admin account
    #[serde(default = "default_labor_rate")]
    pub default_labor_rate: f64,
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize environment variables into Config struct
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let config = envy::from_env::<Config>()?;

        Ok(config)
    }

    /// Get a direct reference to the database URL
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_ttl_minutes)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            bind_addr: default_bind_addr(),
            max_connections: default_max_connections(),
            session_ttl_minutes: default_session_ttl_minutes(),
            default_labor_rate: default_labor_rate(),
            admin_username: default_admin_username(),
            admin_password: default_admin_password(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://aluminium.db?mode=rwc".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_session_ttl_minutes() -> i64 {
    12 * 60
}

fn default_labor_rate() -> f64 {
    50.0
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

/// Initialize environment variables and load configuration
pub fn init() -> Result<Config> {
    let config = Config::load()?;

    Ok(config)
}
