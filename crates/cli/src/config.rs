// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Lookup configuration
//!
//! Settings are layered with the `config` crate, later sources overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. `cep-lookup.json` in the working directory, if present
//! 3. `cep-lookup.{ENVIRONMENT}.json`, if present
//! 4. A file passed with `--config` (must exist)
//! 5. Environment variables prefixed with `CEP_`, using `__` for nesting
//!    (`CEP_DEADLINE_MS`, `CEP_VIACEP__BASE_URL`)
//!
//! Command line flags are applied last by the binary.

use std::{path::Path, time::Duration};

use cep_providers::{BrasilApiConfig, DEFAULT_DEADLINE, RaceStrategy, ViaCepConfig};
use config::{Config, ConfigError, Environment as ConfigEnv, File, Map};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::error::{CliError, CliResult};

const MAX_DEADLINE_MS: u64 = 60_000;
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;
const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 300;

/// A validated race deadline in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeadlineMillis(u64);

impl DeadlineMillis {
    /// Create a new `DeadlineMillis`, ensuring the value is within valid bounds
    ///
    /// # Errors
    ///
    /// Returns an error if the deadline is 0 or greater than 60000 milliseconds
    pub fn new(millis: u64) -> CliResult<Self> {
        if millis == 0 {
            return Err(CliError::Config {
                message: "deadline must be greater than 0".to_string(),
            });
        }
        if millis > MAX_DEADLINE_MS {
            return Err(CliError::Config {
                message: format!("deadline cannot exceed {MAX_DEADLINE_MS} ms"),
            });
        }
        Ok(Self(millis))
    }

    /// Milliseconds
    pub fn value(&self) -> u64 {
        self.0
    }

    /// As a `Duration`
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl Default for DeadlineMillis {
    fn default() -> Self {
        Self(u64::try_from(DEFAULT_DEADLINE.as_millis()).unwrap_or(MAX_DEADLINE_MS))
    }
}

impl<'de> Deserialize<'de> for DeadlineMillis {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Self::new(millis).map_err(|e| de::Error::custom(e.to_string()))
    }
}

/// A validated per-request HTTP timeout in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequestTimeoutSeconds(u64);

impl RequestTimeoutSeconds {
    /// Create a new `RequestTimeoutSeconds`
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout is 0 or greater than 300 seconds
    pub fn new(seconds: u64) -> CliResult<Self> {
        if seconds == 0 || seconds > MAX_REQUEST_TIMEOUT_SECONDS {
            return Err(CliError::Config {
                message: format!(
                    "request timeout must be between 1 and {MAX_REQUEST_TIMEOUT_SECONDS} seconds"
                ),
            });
        }
        Ok(Self(seconds))
    }

    /// Seconds
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl Default for RequestTimeoutSeconds {
    fn default() -> Self {
        Self(DEFAULT_REQUEST_TIMEOUT_SECONDS)
    }
}

impl<'de> Deserialize<'de> for RequestTimeoutSeconds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let seconds = u64::deserialize(deserializer)?;
        Self::new(seconds).map_err(|e| de::Error::custom(e.to_string()))
    }
}

/// Settings shared by every provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Whether the provider takes part in the race
    pub enabled: bool,
    /// Base URL the request path is appended to
    pub base_url: String,
}

/// Complete lookup configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Deadline shared by all providers
    pub deadline_ms: DeadlineMillis,
    /// Race strategy
    pub strategy: RaceStrategy,
    /// HTTP timeout applied to each provider request
    pub request_timeout_seconds: RequestTimeoutSeconds,
    /// BrasilAPI settings
    pub brasil_api: ProviderSettings,
    /// ViaCEP settings
    pub viacep: ProviderSettings,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            deadline_ms: DeadlineMillis::default(),
            strategy: RaceStrategy::default(),
            request_timeout_seconds: RequestTimeoutSeconds::default(),
            brasil_api: ProviderSettings {
                enabled: true,
                base_url: BrasilApiConfig::default().base_url,
            },
            viacep: ProviderSettings {
                enabled: true,
                base_url: ViaCepConfig::default().base_url,
            },
        }
    }
}

impl LookupConfig {
    /// Load configuration from files and the environment
    ///
    /// # Errors
    ///
    /// Returns `CliError::Config` if a source cannot be read or a value is invalid
    pub fn from_env(config_file: Option<&Path>) -> CliResult<Self> {
        Self::load(config_file).map_err(|e| CliError::Config {
            message: format!("failed to load configuration: {e}"),
        })
    }

    /// Load configuration using the config crate with hierarchical sources
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_file, None)
    }

    /// Load configuration, reading `CEP_*` variables from `env` instead of the process
    /// environment when it is given
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or is invalid.
    pub fn load_with_env(
        config_file: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let env_var = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        let defaults = Self::default();

        let mut config_builder = Config::builder()
            .set_default("deadline_ms", defaults.deadline_ms.value())?
            .set_default("strategy", defaults.strategy.to_string())?
            .set_default(
                "request_timeout_seconds",
                defaults.request_timeout_seconds.value(),
            )?
            .set_default("brasil_api.enabled", defaults.brasil_api.enabled)?
            .set_default("brasil_api.base_url", defaults.brasil_api.base_url)?
            .set_default("viacep.enabled", defaults.viacep.enabled)?
            .set_default("viacep.base_url", defaults.viacep.base_url)?
            .add_source(File::with_name("cep-lookup.json").required(false))
            .add_source(
                File::with_name(&format!("cep-lookup.{}.json", env_var.to_lowercase()))
                    .required(false),
            );

        if let Some(path) = config_file {
            config_builder = config_builder.add_source(File::from(path).required(true));
        }

        let config = config_builder
            .add_source(
                ConfigEnv::with_prefix("CEP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Configuration for the BrasilAPI client
    pub fn brasil_api_config(&self) -> BrasilApiConfig {
        BrasilApiConfig {
            base_url: self.brasil_api.base_url.clone(),
            timeout_seconds: self.request_timeout_seconds.value(),
        }
    }

    /// Configuration for the ViaCEP client
    pub fn viacep_config(&self) -> ViaCepConfig {
        ViaCepConfig {
            base_url: self.viacep.base_url.clone(),
            timeout_seconds: self.request_timeout_seconds.value(),
        }
    }
}
