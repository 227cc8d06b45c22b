/// Configuration management for the API server
///
/// Settings come from environment variables (after loading `.env` when
/// present), layered over defaults with the `config` crate, then validated.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 3000)
/// - `API_CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `API_PRODUCTION`: Enables HSTS (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Token signing secret, at least 32 characters (required)
/// - `JWT_EXPIRATION_HOURS`: Token lifetime (default: 168)
/// - `RATE_LIMIT_AUTH_MAX_REQUESTS`: Auth requests per window (default: 20)
/// - `RATE_LIMIT_AUTH_WINDOW_SECONDS`: Auth rate limit window (default: 120)
///
/// # Example
///
/// ```no_run
/// use dailyreport_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Shortest accepted JWT secret
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode turns on HSTS
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Token lifetime in hours
    pub expiration_hours: i64,
}

/// Rate limit applied to the authentication routes
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub auth_max_requests: u32,
    pub auth_window_seconds: u64,
}

/// Flat view of the environment, one field per variable
#[derive(Debug, Deserialize)]
struct RawSettings {
    api_host: String,
    api_port: u16,
    api_cors_origins: String,
    api_production: bool,
    database_url: Option<String>,
    database_max_connections: u32,
    jwt_secret: Option<String>,
    jwt_expiration_hours: i64,
    rate_limit_auth_max_requests: u32,
    rate_limit_auth_window_seconds: u64,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` or `JWT_SECRET` is missing
    /// - a variable has an unparsable value
    /// - `JWT_SECRET` is shorter than 32 characters
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::load(config::Environment::default().try_parsing(true))
    }

    /// Builds configuration from an environment source over the defaults
    pub fn load(env: config::Environment) -> anyhow::Result<Self> {
        let raw: RawSettings = config::Config::builder()
            .set_default("api_host", "0.0.0.0")?
            .set_default("api_port", 3000)?
            .set_default("api_cors_origins", "*")?
            .set_default("api_production", false)?
            .set_default("database_max_connections", 10)?
            .set_default("jwt_expiration_hours", 168)?
            .set_default("rate_limit_auth_max_requests", 20)?
            .set_default("rate_limit_auth_window_seconds", 120)?
            .add_source(env)
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration value")?;

        let database_url = raw
            .database_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = raw
            .jwt_secret
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LEN
            );
        }

        if raw.jwt_expiration_hours <= 0 {
            anyhow::bail!("JWT_EXPIRATION_HOURS must be positive");
        }

        if raw.rate_limit_auth_max_requests == 0 || raw.rate_limit_auth_window_seconds == 0 {
            anyhow::bail!("Auth rate limit must allow at least one request per window");
        }

        Ok(Self {
            api: ApiConfig {
                host: raw.api_host,
                port: raw.api_port,
                cors_origins: split_origins(&raw.api_cors_origins),
                production: raw.api_production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: raw.database_max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_hours: raw.jwt_expiration_hours,
            },
            rate_limit: RateLimitConfig {
                auth_max_requests: raw.rate_limit_auth_max_requests,
                auth_window_seconds: raw.rate_limit_auth_window_seconds,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether any origin may call the API
    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|o| o == "*")
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
