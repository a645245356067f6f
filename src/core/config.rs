use config::{Config, Environment, File};
use serde::Deserialize;

use crate::core::error::Result;
use crate::{DEFAULT_API_URL, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_SAMPLE_LIMIT};

/// Runtime configuration: defaults, then an optional `brewlog.toml` in the
/// working directory, then `BREWLOG_*` environment overrides
/// (e.g. `BREWLOG_API__BASE_URL`).
#[derive(Debug, Clone, Deserialize)]
pub struct JournalConfig {
    pub api: ApiConfig,
    pub usage: UsageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Root of the journal API, e.g. `http://localhost:5000/api`.
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsageConfig {
    /// Upper bound on `recent_samples` in usage reports.
    pub sample_limit: usize,
}

impl JournalConfig {
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            .set_default("api.base_url", DEFAULT_API_URL)?
            .set_default("api.timeout_secs", DEFAULT_HTTP_TIMEOUT_SECS)?
            .set_default("usage.sample_limit", DEFAULT_SAMPLE_LIMIT as u64)?
            .add_source(File::with_name("brewlog").required(false))
            .add_source(Environment::with_prefix("BREWLOG").separator("__"))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: DEFAULT_API_URL.to_string(),
                timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            },
            usage: UsageConfig {
                sample_limit: DEFAULT_SAMPLE_LIMIT,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = JournalConfig::default();
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
        assert_eq!(config.usage.sample_limit, DEFAULT_SAMPLE_LIMIT);
    }
}
