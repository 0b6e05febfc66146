//! Runtime configuration loaded from the environment
//!
//! All parsing goes through [`AppConfig::from_lookup`] so tests can feed a map
//! instead of mutating the process environment.

use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Client credentials for one OAuth provider
#[derive(Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub public_base_url: String,
    pub frontend_url: String,
    pub cors_origins: Vec<String>,
    pub port: u16,
    pub outbound_timeout: Duration,
    pub request_timeout: Duration,
    pub github: Option<OAuthCredentials>,
    pub google: Option<OAuthCredentials>,
    /// Drop all tables before migrating
    pub reset_db: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://job_tracker.db".to_string());

        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let frontend_url = lookup("FRONTEND_URL")
            .unwrap_or_else(|| "http://localhost:4200".to_string())
            .trim_end_matches('/')
            .to_string();

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:4200".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        // Credentialed CORS cannot use a wildcard origin
        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ConfigError::Invalid {
                name: "CORS_ORIGINS",
                reason: "'*' is not allowed; list explicit origins".to_string(),
            });
        }

        Ok(Self {
            database_url,
            jwt_secret,
            token_ttl: Duration::from_secs(parse_or(&lookup, "JWT_TTL_SECONDS", 3600)?),
            public_base_url,
            frontend_url,
            cors_origins,
            port: parse_or(&lookup, "PORT", 8080)?,
            outbound_timeout: Duration::from_secs(parse_or(&lookup, "OUTBOUND_TIMEOUT_SECS", 10)?),
            request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 15)?),
            github: oauth_credentials(&lookup, "GITHUB_CLIENT_ID", "GITHUB_CLIENT_SECRET"),
            google: oauth_credentials(&lookup, "GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
            reset_db: parse_or(&lookup, "RESET_DB", false)?,
        })
    }

    #[cfg(test)]
    pub fn from_map(values: &std::collections::HashMap<&str, &str>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| values.get(key).map(|v| v.to_string()))
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn oauth_credentials<F>(lookup: &F, id_key: &str, secret_key: &str) -> Option<OAuthCredentials>
where
    F: Fn(&str) -> Option<String>,
{
    let client_id = lookup(id_key).filter(|v| !v.is_empty())?;
    let client_secret = lookup(secret_key).filter(|v| !v.is_empty())?;
    Some(OAuthCredentials {
        client_id,
        client_secret,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_secret_is_fatal() {
        let result = AppConfig::from_map(&HashMap::new());
        assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));

        let blank = HashMap::from([("JWT_SECRET", "   ")]);
        assert!(matches!(
            AppConfig::from_map(&blank),
            Err(ConfigError::Missing("JWT_SECRET"))
        ));
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_map(&HashMap::from([("JWT_SECRET", "s3cret")])).unwrap();

        assert_eq!(config.token_ttl, Duration::from_secs(3600));
        assert_eq!(config.outbound_timeout, Duration::from_secs(10));
        assert_eq!(config.port, 8080);
        assert_eq!(config.frontend_url, "http://localhost:4200");
        assert!(config.github.is_none());
        assert!(config.google.is_none());
        assert!(!config.reset_db);
    }

    #[test]
    fn test_reset_db_flag() {
        let config = AppConfig::from_map(&HashMap::from([
            ("JWT_SECRET", "s3cret"),
            ("RESET_DB", "true"),
        ]))
        .unwrap();
        assert!(config.reset_db);

        let result = AppConfig::from_map(&HashMap::from([
            ("JWT_SECRET", "s3cret"),
            ("RESET_DB", "yes"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { name: "RESET_DB", .. })));
    }

    #[test]
    fn test_wildcard_cors_origin_rejected() {
        let result = AppConfig::from_map(&HashMap::from([
            ("JWT_SECRET", "s3cret"),
            ("CORS_ORIGINS", "http://localhost:4200, *"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name: "CORS_ORIGINS", .. })
        ));
    }

    #[test]
    fn test_provider_needs_both_credentials() {
        let config = AppConfig::from_map(&HashMap::from([
            ("JWT_SECRET", "s3cret"),
            ("GITHUB_CLIENT_ID", "id"),
            ("GITHUB_CLIENT_SECRET", "secret"),
            ("GOOGLE_CLIENT_ID", "only-the-id"),
            ("FRONTEND_URL", "https://tracker.example.com/"),
        ]))
        .unwrap();

        assert!(config.github.is_some());
        assert!(config.google.is_none());
        assert_eq!(config.frontend_url, "https://tracker.example.com");
    }

    #[test]
    fn test_invalid_number() {
        let result = AppConfig::from_map(&HashMap::from([
            ("JWT_SECRET", "s3cret"),
            ("PORT", "eighty"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { name: "PORT", .. })));
    }
}
