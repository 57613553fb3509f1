// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the lookup command
//!
//! Provider failures are not errors at this level: they are part of the race outcome
//! and get rendered like any other result. Only problems that prevent a race from
//! starting, or its result from being printed, end up here.

use cep_providers::{BrasilApiError, RaceError, ViaCepError};
use thiserror::Error;

/// Errors raised while preparing or reporting a lookup
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// A provider client could not be built from its configuration
    #[error("Failed to create {provider} client: {message}")]
    Provider {
        /// Provider label
        provider: &'static str,
        /// Error message
        message: String,
    },

    /// Coordinator construction errors
    #[error(transparent)]
    Race(#[from] RaceError),

    /// JSON rendering errors
    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Result type for command operations
pub type CliResult<T> = Result<T, CliError>;

impl From<config::ConfigError> for CliError {
    fn from(value: config::ConfigError) -> Self {
        CliError::Config {
            message: value.to_string(),
        }
    }
}

impl From<BrasilApiError> for CliError {
    fn from(value: BrasilApiError) -> Self {
        CliError::Provider {
            provider: "BrasilAPI",
            message: value.to_string(),
        }
    }
}

impl From<ViaCepError> for CliError {
    fn from(value: ViaCepError) -> Self {
        CliError::Provider {
            provider: "ViaCEP",
            message: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_error_display() {
        let error = CliError::Config {
            message: "deadline must be greater than 0".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration error: deadline must be greater than 0"
        );

        let error = CliError::from(RaceError::NoProviders);
        assert_eq!(error.to_string(), "No address providers registered");

        let error = CliError::from(ViaCepError::Config("Base URL cannot be empty".to_string()));
        assert_eq!(
            error.to_string(),
            "Failed to create ViaCEP client: Configuration error: Base URL cannot be empty"
        );
    }
}
