// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! CEP lookup command
//!
//! Wires configuration, the provider clients and the race coordinator together for the
//! `cep-lookup` binary.
//!
//! # Module Structure
//!
//! - [`config`]: layered configuration with validated deadline and timeout values
//! - [`error`]: errors that prevent a lookup from starting or being reported
//! - [`output`]: text and JSON rendering of race outcomes

use std::{path::PathBuf, sync::Arc};

use address_client::AddressProvider;
use cep_providers::{BrasilApiClient, RaceCoordinator, RaceOutcome, RaceStrategy, ViaCepClient};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub mod config;
pub mod error;
pub mod output;

pub use config::{DeadlineMillis, LookupConfig, ProviderSettings, RequestTimeoutSeconds};
pub use error::{CliError, CliResult};

/// CEP looked up when none is given
pub const DEFAULT_CEP: &str = "01153000";

/// Command line arguments
#[derive(Debug, Parser)]
#[command(
    name = "cep-lookup",
    version,
    about = "Look up a Brazilian postal code, racing BrasilAPI against ViaCEP"
)]
pub struct Cli {
    /// Postal code to look up
    #[arg(default_value = DEFAULT_CEP)]
    pub cep: String,

    /// Deadline shared by all providers, in milliseconds
    #[arg(long, value_name = "MS")]
    pub deadline_ms: Option<u64>,

    /// How provider failures are treated: first-success or first-signal
    #[arg(long)]
    pub strategy: Option<RaceStrategy>,

    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,

    /// Additional configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Apply command line overrides on top of the loaded configuration
    ///
    /// # Errors
    ///
    /// Returns `CliError::Config` if `--deadline-ms` is out of range
    pub fn apply(&self, mut config: LookupConfig) -> CliResult<LookupConfig> {
        if let Some(deadline_ms) = self.deadline_ms {
            config.deadline_ms = DeadlineMillis::new(deadline_ms)?;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        Ok(config)
    }
}

/// Build the race coordinator for the enabled providers
///
/// # Errors
///
/// Returns an error if a provider client cannot be created or no provider is enabled
pub fn build_coordinator(config: &LookupConfig) -> CliResult<RaceCoordinator> {
    let mut providers: Vec<Arc<dyn AddressProvider>> = Vec::new();

    if config.brasil_api.enabled {
        providers.push(Arc::new(BrasilApiClient::new(config.brasil_api_config())?));
    } else {
        debug!("BrasilAPI disabled by configuration");
    }

    if config.viacep.enabled {
        providers.push(Arc::new(ViaCepClient::new(config.viacep_config())?));
    } else {
        debug!("ViaCEP disabled by configuration");
    }

    let coordinator = RaceCoordinator::new(providers, config.deadline_ms.duration())?
        .with_strategy(config.strategy);

    info!(
        providers = ?coordinator.provider_names(),
        deadline_ms = config.deadline_ms.value(),
        strategy = %config.strategy,
        "lookup configured"
    );

    Ok(coordinator)
}

/// Run one lookup for `cep`, stopping early if `shutdown` is cancelled
///
/// # Errors
///
/// Returns an error if the coordinator cannot be built; provider failures are
/// reported through the returned outcome instead
pub async fn lookup(
    config: &LookupConfig,
    cep: &str,
    shutdown: &CancellationToken,
) -> CliResult<RaceOutcome> {
    let coordinator = build_coordinator(config)?;
    Ok(coordinator.race_with_cancellation(cep, shutdown).await)
}
