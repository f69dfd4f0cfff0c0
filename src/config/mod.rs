use jsonwebtoken::Algorithm;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub bootstrap: BootstrapConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    /// How often identities with an empty window are evicted
    pub rate_limit_sweep_secs: u64,
    /// Key the limiter on X-Forwarded-For / X-Real-IP instead of the peer address
    pub trust_proxy_headers: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_algorithm: String,
    /// Lifetime applied by `TokenService::issue` when the caller passes no ttl
    pub token_default_ttl_minutes: u64,
    /// Lifetime of tokens handed out by the login endpoint
    pub access_token_expire_minutes: u64,
    pub cors_origins: Vec<String>,
    /// Whether `/register` accepts `admin` and `moderator` user types
    pub allow_privileged_registration: bool,
    pub password_hash_memory_kib: u32,
    pub password_hash_iterations: u32,
}

/// Administrator account created at startup when it does not exist yet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub admin_username: Option<String>,
    pub admin_email: Option<String>,
    #[serde(skip_serializing)]
    pub admin_password: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set")]
    MissingSecret,

    #[error("Unsupported signing algorithm '{0}', expected HS256, HS384 or HS512")]
    UnsupportedAlgorithm(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // API overrides
        if let Ok(v) = env::var("API_RATE_LIMIT_REQUESTS") {
            self.api.rate_limit_requests = v.parse().unwrap_or(self.api.rate_limit_requests);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_WINDOW_SECS") {
            self.api.rate_limit_window_secs = v.parse().unwrap_or(self.api.rate_limit_window_secs);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_SWEEP_SECS") {
            self.api.rate_limit_sweep_secs = v.parse().unwrap_or(self.api.rate_limit_sweep_secs);
        }
        if let Ok(v) = env::var("API_TRUST_PROXY_HEADERS") {
            self.api.trust_proxy_headers = v.parse().unwrap_or(self.api.trust_proxy_headers);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_ALGORITHM") {
            self.security.jwt_algorithm = v.trim().to_uppercase();
        }
        if let Ok(v) = env::var("TOKEN_DEFAULT_TTL_MINUTES") {
            self.security.token_default_ttl_minutes = v.parse().unwrap_or(self.security.token_default_ttl_minutes);
        }
        if let Ok(v) = env::var("ACCESS_TOKEN_EXPIRE_MINUTES") {
            self.security.access_token_expire_minutes = v.parse().unwrap_or(self.security.access_token_expire_minutes);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if let Ok(v) = env::var("SECURITY_ALLOW_PRIVILEGED_REGISTRATION") {
            self.security.allow_privileged_registration = v.parse().unwrap_or(self.security.allow_privileged_registration);
        }
        if let Ok(v) = env::var("PASSWORD_HASH_MEMORY_KIB") {
            self.security.password_hash_memory_kib = v.parse().unwrap_or(self.security.password_hash_memory_kib);
        }
        if let Ok(v) = env::var("PASSWORD_HASH_ITERATIONS") {
            self.security.password_hash_iterations = v.parse().unwrap_or(self.security.password_hash_iterations);
        }

        // Admin bootstrap
        if let Ok(v) = env::var("ADMIN_USERNAME") {
            self.bootstrap.admin_username = Some(v).filter(|v| !v.trim().is_empty());
        }
        if let Ok(v) = env::var("ADMIN_EMAIL") {
            self.bootstrap.admin_email = Some(v).filter(|v| !v.trim().is_empty());
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD") {
            self.bootstrap.admin_password = Some(v).filter(|v| !v.is_empty());
        }

        if let Ok(v) = env::var("LOG_LEVEL") {
            self.log_level = v.to_lowercase();
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            api: ApiConfig {
                rate_limit_requests: 60,
                rate_limit_window_secs: 60,
                rate_limit_sweep_secs: 300,
                trust_proxy_headers: false,
            },
            security: SecurityConfig {
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_algorithm: "HS256".to_string(),
                token_default_ttl_minutes: 15,
                access_token_expire_minutes: 30,
                cors_origins: vec!["*".to_string()],
                allow_privileged_registration: true,
                password_hash_memory_kib: 19 * 1024,
                password_hash_iterations: 2,
            },
            bootstrap: BootstrapConfig::default(),
            log_level: "debug".to_string(),
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            api: ApiConfig {
                rate_limit_requests: 60,
                rate_limit_window_secs: 60,
                rate_limit_sweep_secs: 120,
                trust_proxy_headers: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_algorithm: "HS256".to_string(),
                token_default_ttl_minutes: 15,
                access_token_expire_minutes: 30,
                cors_origins: vec!["https://staging.example.com".to_string()],
                allow_privileged_registration: true,
                password_hash_memory_kib: 19 * 1024,
                password_hash_iterations: 2,
            },
            bootstrap: BootstrapConfig::default(),
            log_level: "info".to_string(),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            api: ApiConfig {
                rate_limit_requests: 60,
                rate_limit_window_secs: 60,
                rate_limit_sweep_secs: 60,
                trust_proxy_headers: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_algorithm: "HS256".to_string(),
                token_default_ttl_minutes: 15,
                access_token_expire_minutes: 30,
                cors_origins: vec!["https://app.example.com".to_string()],
                allow_privileged_registration: false,
                password_hash_memory_kib: 19 * 1024,
                password_hash_iterations: 2,
            },
            bootstrap: BootstrapConfig::default(),
            log_level: "info".to_string(),
        }
    }

    /// Signing algorithm parsed from `security.jwt_algorithm`, restricted to the HMAC family
    pub fn signing_algorithm(&self) -> Result<Algorithm, ConfigError> {
        let name = self.security.jwt_algorithm.as_str();
        match Algorithm::from_str(name) {
            Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
            _ => Err(ConfigError::UnsupportedAlgorithm(name.to_string())),
        }
    }

    /// Reject configurations the server must not start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingSecret);
        }
        self.signing_algorithm()?;

        if self.api.rate_limit_requests == 0 {
            return Err(ConfigError::InvalidValue {
                field: "API_RATE_LIMIT_REQUESTS",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.api.rate_limit_window_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "API_RATE_LIMIT_WINDOW_SECS",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.security.token_default_ttl_minutes == 0 || self.security.access_token_expire_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "token ttl",
                reason: "token lifetimes must be positive".to_string(),
            });
        }
        if self.bootstrap.admin_username.is_some() && self.bootstrap.admin_password.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "ADMIN_PASSWORD",
                reason: "required when ADMIN_USERNAME is set".to_string(),
            });
        }
        Ok(())
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
