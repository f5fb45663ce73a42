//! Client configuration from the environment

use crate::connection::ReconnectPolicy;
use crate::session::{SessionId, SessionOptions};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8000";
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 2000;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must not be empty")]
    Empty { var: &'static str },

    #[error("PERFCHAT_SERVER_URL must start with ws:// or wss://, got {0:?}")]
    InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    /// Issued by the service's bootstrap endpoint; generated when absent
    pub session_id: SessionId,
    pub reconnect_delay: Duration,
    pub channel_capacity: usize,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server_url = match lookup("PERFCHAT_SERVER_URL") {
            Some(url) => {
                let url = url.trim().trim_end_matches('/').to_string();
                if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                    return Err(ConfigError::InvalidUrl(url));
                }
                url
            }
            None => DEFAULT_SERVER_URL.to_string(),
        };

        let session_id = match lookup("PERFCHAT_SESSION_ID") {
            Some(id) if id.trim().is_empty() => {
                return Err(ConfigError::Empty {
                    var: "PERFCHAT_SESSION_ID",
                })
            }
            Some(id) => SessionId::new(id.trim()),
            None => SessionId::generate(),
        };

        let reconnect_delay = Duration::from_millis(positive(
            &lookup,
            "PERFCHAT_RECONNECT_DELAY_MS",
            DEFAULT_RECONNECT_DELAY_MS,
        )?);

        let channel_capacity = positive(
            &lookup,
            "PERFCHAT_CHANNEL_CAPACITY",
            DEFAULT_CHANNEL_CAPACITY,
        )?;

        Ok(Self {
            server_url,
            session_id,
            reconnect_delay,
            channel_capacity,
        })
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            reconnect: ReconnectPolicy::fixed(self.reconnect_delay),
            command_capacity: self.channel_capacity,
        }
    }
}

fn positive<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default,
{
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(n) if n != T::default() => Ok(n),
        _ => Err(ConfigError::InvalidNumber { var, value: raw }),
    }
}
