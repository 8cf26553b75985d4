use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::narrator::{DEFAULT_ENDPOINT, DEFAULT_MODEL, NarratorSettings, RetryPolicy};

pub const CREDENTIAL_VAR: &str = "OPENROUTER_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not valid: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub log_format: LogFormat,
    pub narrator: NarratorSettings,
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = parse_var(&lookup, "ADVISOR_LISTEN_ADDR", "0.0.0.0:8080")?;
        let log_format = match lookup("ADVISOR_LOG_FORMAT") {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let defaults = RetryPolicy::default();
        let timeout_secs: u64 = parse_var(
            &lookup,
            "ADVISOR_NARRATOR_TIMEOUT_SECS",
            &defaults.attempt_timeout.as_secs().to_string(),
        )?;
        let max_attempts: u32 = parse_var(
            &lookup,
            "ADVISOR_NARRATOR_ATTEMPTS",
            &defaults.max_attempts.to_string(),
        )?;

        let narrator = NarratorSettings {
            endpoint: lookup("ADVISOR_NARRATOR_URL").unwrap_or_else(|| DEFAULT_ENDPOINT.into()),
            model: lookup("ADVISOR_NARRATOR_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            api_key: lookup(CREDENTIAL_VAR).filter(|key| !key.trim().is_empty()),
            retry: RetryPolicy {
                max_attempts,
                attempt_timeout: Duration::from_secs(timeout_secs),
                ..defaults
            },
        };

        Ok(Self {
            listen_addr,
            log_format,
            narrator,
        })
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let value = lookup(var).unwrap_or_else(|| default.to_string());
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value })
}
