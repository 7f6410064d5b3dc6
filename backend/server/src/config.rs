use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use auth::rest::DEFAULT_IDENTITY_URL;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value: {message}")]
    Invalid { key: String, message: String },

    #[error("Secret {name} unavailable: {source}")]
    Secret {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Which collaborators back the store and identity seams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Hosted(Hosted),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hosted {
    pub redis_url: String,
    pub identity_url: String,
    pub identity_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Hosted,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "hosted" => Ok(BackendKind::Hosted),
            other => Err(format!("expected memory or hosted, got {other}")),
        }
    }
}

pub struct Config {
    pub port: u16,
    pub backend: Backend,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let backend = match try_load("CLINIC_BACKEND", "memory")? {
            BackendKind::Memory => Backend::Memory,
            BackendKind::Hosted => Backend::Hosted(Hosted {
                redis_url: try_load("REDIS_URL", "redis://redis:6379")?,
                identity_url: try_load("IDENTITY_URL", DEFAULT_IDENTITY_URL)?,
                identity_key: read_secret("IDENTITY_API_KEY")?,
            }),
        };

        Ok(Self {
            port: try_load("RUST_PORT", "1111")?,
            backend,
        })
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    parse(
        key,
        var(key).unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        }),
    )
}

fn parse<T: FromStr>(key: &str, raw: String) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    raw.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");

        ConfigError::Invalid {
            key: key.to_string(),
            message: e.to_string(),
        }
    })
}

fn read_secret(secret_name: &str) -> Result<String, ConfigError> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|source| {
            warn!("Failed to read {secret_name} from file: {source}");

            ConfigError::Secret {
                name: secret_name.to_string(),
                source,
            }
        })
}
