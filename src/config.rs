use std::env;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEPLOYMENT_VAR: &str = "AZURE_OPENAI_CHAT_DEPLOYMENT_NAME";
pub const API_VERSION_VAR: &str = "AZURE_OPENAI_API_VERSION";
pub const ENDPOINT_VAR: &str = "AZURE_OPENAI_ENDPOINT";
pub const API_KEY_VAR: &str = "AZURE_OPENAI_API_KEY";
pub const TIMEOUT_VAR: &str = "AZURE_OPENAI_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Settings for the Azure OpenAI chat deployment.
#[derive(Clone)]
pub struct AzureConfig {
    pub deployment: String,
    pub api_version: String,
    pub endpoint: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl AzureConfig {
    /// Read settings from the process environment. Call after `dotenv()`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read settings through `lookup`. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let deployment = required(DEPLOYMENT_VAR)?;
        let api_version = required(API_VERSION_VAR)?;
        let endpoint = required(ENDPOINT_VAR)?;
        let api_key = required(API_KEY_VAR)?;

        let timeout_secs = match lookup(TIMEOUT_VAR) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: TIMEOUT_VAR,
                reason: e.to_string(),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            deployment,
            api_version,
            endpoint,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl std::fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureConfig")
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}
