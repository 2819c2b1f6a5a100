use locker_core::civil_time::{CivilClock, DEFAULT_UTC_OFFSET_MINUTES};
use locker_core::media_url::DEFAULT_MEDIA_ORIGIN;
use locker_core::upload::{AppEnvironment, ReuploadPolicy};
use locker_storage::StorageConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development except the JWT
/// secret.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// Timeout for ordinary requests in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Timeout for the media upload route in seconds (default: `900`).
    pub upload_timeout_secs: u64,
    pub jwt: JwtConfig,
    pub locker: LockerConfig,
    pub storage: StorageConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `UPLOAD_TIMEOUT_SECS`  | `900`                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let upload_timeout_secs: u64 = std::env::var("UPLOAD_TIMEOUT_SECS")
            .unwrap_or_else(|_| "900".into())
            .parse()
            .expect("UPLOAD_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            upload_timeout_secs,
            jwt: JwtConfig::from_env(),
            locker: LockerConfig::from_env(),
            storage: StorageConfig::from_env(),
        }
    }
}

/// Locker behaviour that differs between deployments.
#[derive(Debug, Clone)]
pub struct LockerConfig {
    /// Non-production environments write media under `test/`.
    pub environment: AppEnvironment,
    /// Origin prefixed to relative stored media paths.
    pub media_origin: String,
    /// Converts between UTC and the civil time stored in the database.
    pub clock: CivilClock,
    pub reupload: ReuploadPolicy,
}

impl Default for LockerConfig {
    fn default() -> Self {
        Self {
            environment: AppEnvironment::Local,
            media_origin: DEFAULT_MEDIA_ORIGIN.to_string(),
            clock: CivilClock::default(),
            reupload: ReuploadPolicy::Overwrite,
        }
    }
}

impl LockerConfig {
    /// Load locker settings from environment variables.
    ///
    /// | Env Var                    | Default                             |
    /// |----------------------------|-------------------------------------|
    /// | `APP_ENV`                  | `local`                             |
    /// | `MEDIA_ORIGIN`             | `https://v1sports.com/SwingStore/`  |
    /// | `CIVIL_UTC_OFFSET_MINUTES` | `-300`                              |
    /// | `LOCKER_REUPLOAD`          | `overwrite`                         |
    ///
    /// # Panics
    ///
    /// Panics on any unparseable value.
    pub fn from_env() -> Self {
        let environment = std::env::var("APP_ENV")
            .map(|name| AppEnvironment::from_name(&name).unwrap_or_else(|e| panic!("{e}")))
            .unwrap_or(AppEnvironment::Local);

        let media_origin =
            std::env::var("MEDIA_ORIGIN").unwrap_or_else(|_| DEFAULT_MEDIA_ORIGIN.into());

        let offset: i32 = std::env::var("CIVIL_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| DEFAULT_UTC_OFFSET_MINUTES.to_string())
            .parse()
            .expect("CIVIL_UTC_OFFSET_MINUTES must be a valid i32");
        let clock = CivilClock::from_offset_minutes(offset).unwrap_or_else(|e| panic!("{e}"));

        let reupload = std::env::var("LOCKER_REUPLOAD")
            .map(|name| ReuploadPolicy::from_name(&name).unwrap_or_else(|e| panic!("{e}")))
            .unwrap_or(ReuploadPolicy::Overwrite);

        Self {
            environment,
            media_origin,
            clock,
            reupload,
        }
    }
}
