/// Configuration management for Blog Service
///
/// All settings come from environment variables (a `.env` file is loaded by
/// the binary before this runs).
use serde::{Deserialize, Serialize};

const DEV_SESSION_SECRET: &str = "blog-service-development-secret";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Storage backend selection
    pub storage: StorageBackend,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Session / login settings
    pub auth: AuthConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Number of actix workers
    pub workers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

/// Session token and login redirect settings
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the login flow
    pub session_secret: String,
    /// Cookie carrying the session token
    pub session_cookie: String,
    /// Where anonymous actors are sent; `?next=` is appended
    pub login_url: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_secret", &"[REDACTED]")
            .field("session_cookie", &self.session_cookie)
            .field("login_url", &self.login_url)
            .finish()
    }
}

impl AuthConfig {
    /// Login URL carrying `next` so the login flow can send the actor back.
    pub fn login_redirect(&self, next: &str) -> String {
        format!("{}?next={}", self.login_url, urlencoding::encode(next))
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: DEV_SESSION_SECRET.to_string(),
            session_cookie: "session".to_string(),
            login_url: "/auth/login/".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let storage = match std::env::var("BLOG_STORAGE") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::Postgres,
        };
        if production && storage == StorageBackend::Memory {
            return Err("BLOG_STORAGE=memory is not allowed in production".to_string());
        }

        let session_secret = match std::env::var("SESSION_SECRET") {
            Ok(value) if !value.trim().is_empty() => value,
            _ if production => {
                return Err("SESSION_SECRET must be set in production".to_string());
            }
            _ => DEV_SESSION_SECRET.to_string(),
        };

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("BLOG_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("BLOG_SERVICE_PORT", 8000)?,
                workers: parse_env_or_default("BLOG_SERVICE_WORKERS", 4)?,
            },
            storage,
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/blog".to_string()),
                max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            auth: AuthConfig {
                session_secret,
                session_cookie: std::env::var("SESSION_COOKIE_NAME")
                    .unwrap_or_else(|_| "session".to_string()),
                login_url: std::env::var("LOGIN_URL")
                    .unwrap_or_else(|_| "/auth/login/".to_string()),
            },
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}
