//! Runtime configuration, read from the environment.
//!
//! - `GOOGLE_API_KEY` - Gemini API key. Left empty (with a warning) when unset.
//! - `GEMINI_MODEL` - model name. Defaults to `gemini-2.5-flash-lite`.
//! - `GEMINI_API_BASE` - Gemini REST base. Defaults to the public v1beta endpoint.
//! - `BACKEND_URL` - bot-hosting backend. Defaults to `http://localhost:3000`.
//! - `HOST` / `PORT` - bind address. Defaults to `0.0.0.0:8000`.
//! - `MAX_TOOL_ITERATIONS` - runner round limit. Defaults to `10`.

use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";
pub const DEFAULT_MAX_TOOL_ITERATIONS: usize = 10;

/// Retry behaviour of the model client.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub attempts: u32,
    pub exp_base: u32,
    pub initial_delay: Duration,
    pub http_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            exp_base: 2,
            initial_delay: Duration::from_secs(1),
            http_status_codes: vec![429, 500, 503],
        }
    }
}

impl RetryConfig {
    pub fn should_retry(&self, status: u16) -> bool {
        self.http_status_codes.contains(&status)
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.exp_base.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor)
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub name: String,
    pub api_key: String,
    pub api_base: String,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backend_url: String,
    pub model: ModelConfig,
    pub max_tool_iterations: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            model: ModelConfig {
                name: DEFAULT_MODEL.to_string(),
                api_key: String::new(),
                api_base: DEFAULT_API_BASE.to_string(),
                retry: RetryConfig::default(),
            },
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let api_key = get("GOOGLE_API_KEY").unwrap_or_else(|| {
            warn!("GOOGLE_API_KEY is not set; model calls will be rejected");
            String::new()
        });

        let port = match get("PORT") {
            Some(v) => v
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string(), v))?,
            None => defaults.port,
        };

        let max_tool_iterations = match get("MAX_TOOL_ITERATIONS") {
            Some(v) => match v.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidValue("MAX_TOOL_ITERATIONS".to_string(), v)),
            },
            None => defaults.max_tool_iterations,
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port,
            backend_url: get("BACKEND_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.backend_url),
            model: ModelConfig {
                name: get("GEMINI_MODEL").unwrap_or(defaults.model.name),
                api_key,
                api_base: get("GEMINI_API_BASE")
                    .map(|u| u.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.model.api_base),
                retry: RetryConfig::default(),
            },
            max_tool_iterations,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
