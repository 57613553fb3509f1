// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Race coordinator for concurrent address lookups
//!
//! [`RaceCoordinator`] starts one task per provider for a key, shares a single deadline
//! between them and resolves to exactly one [`RaceOutcome`]. Once the race is decided,
//! every provider still running is cancelled through its `CancellationToken` and its
//! task is aborted, so no request outlives the race.
//!
//! # Strategies
//!
//! - [`RaceStrategy::FirstSuccess`]: the first address wins; failures only end the race
//!   once every provider has failed.
//! - [`RaceStrategy::FirstSignal`]: whatever reports first, success or failure, ends
//!   the race.

use std::{collections::HashMap, fmt, str::FromStr, sync::Arc, time::Duration};

use address_client::{Address, AddressProvider, ProviderError};
use serde::{Deserialize, Serialize};
use tokio::{
    task::{Id, JoinError, JoinSet},
    time::{Instant, sleep},
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

/// Deadline applied when none is configured
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(1);

/// How the coordinator treats provider failures
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RaceStrategy {
    /// First address wins; the race fails only when every provider failed
    #[default]
    FirstSuccess,
    /// First report of any kind wins
    FirstSignal,
}

impl fmt::Display for RaceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaceStrategy::FirstSuccess => write!(f, "first-success"),
            RaceStrategy::FirstSignal => write!(f, "first-signal"),
        }
    }
}

impl FromStr for RaceStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-success" => Ok(RaceStrategy::FirstSuccess),
            "first-signal" => Ok(RaceStrategy::FirstSignal),
            other => Err(format!(
                "unknown race strategy '{other}', expected first-success or first-signal"
            )),
        }
    }
}

/// A provider that reported an error during a race
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// Provider label
    pub provider: &'static str,
    /// What went wrong
    pub error: ProviderError,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.error)
    }
}

/// Terminal value of a race
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceOutcome {
    /// A provider produced an address
    Success {
        /// The normalized address
        address: Address,
        /// Label of the winning provider
        provider: &'static str,
    },
    /// Providers failed; all of them under `FirstSuccess`, the first one under `FirstSignal`
    Failure {
        /// Failures in the order they were reported
        failures: Vec<ProviderFailure>,
    },
    /// The deadline elapsed before the race was decided
    Timeout {
        /// The deadline that elapsed
        deadline: Duration,
        /// Failures reported before the deadline
        failures: Vec<ProviderFailure>,
    },
    /// The caller cancelled the race
    Cancelled,
}

impl RaceOutcome {
    /// Whether the race produced an address
    pub fn is_success(&self) -> bool {
        matches!(self, RaceOutcome::Success { .. })
    }

    /// Whether the race ended on the deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, RaceOutcome::Timeout { .. })
    }

    /// Label of the winning provider, if any
    pub fn provider(&self) -> Option<&'static str> {
        match self {
            RaceOutcome::Success { provider, .. } => Some(*provider),
            _ => None,
        }
    }

    /// Failures observed before the race was decided
    pub fn failures(&self) -> &[ProviderFailure] {
        match self {
            RaceOutcome::Failure { failures } | RaceOutcome::Timeout { failures, .. } => failures,
            RaceOutcome::Success { .. } | RaceOutcome::Cancelled => &[],
        }
    }
}

/// Error type for coordinator construction
#[derive(Debug, thiserror::Error)]
pub enum RaceError {
    /// No providers registered
    #[error("No address providers registered")]
    NoProviders,

    /// Deadline of zero
    #[error("Race deadline must be greater than zero")]
    ZeroDeadline,
}

// Event observed by the coordinator while a race is pending
enum RaceEvent {
    Cancelled,
    Expired,
    Reported(Option<Result<(&'static str, Result<Address, ProviderError>), JoinError>>),
}

/// Races a set of providers against one key under a shared deadline
#[derive(Debug, Clone)]
pub struct RaceCoordinator {
    providers: Vec<Arc<dyn AddressProvider>>,
    deadline: Duration,
    strategy: RaceStrategy,
}

impl RaceCoordinator {
    /// Create a coordinator over `providers` using the `FirstSuccess` strategy
    ///
    /// # Errors
    ///
    /// Returns an error if `providers` is empty or `deadline` is zero
    pub fn new(
        providers: Vec<Arc<dyn AddressProvider>>,
        deadline: Duration,
    ) -> Result<Self, RaceError> {
        if providers.is_empty() {
            return Err(RaceError::NoProviders);
        }
        if deadline.is_zero() {
            return Err(RaceError::ZeroDeadline);
        }

        Ok(Self {
            providers,
            deadline,
            strategy: RaceStrategy::default(),
        })
    }

    /// Use `strategy` for subsequent races
    #[must_use]
    pub fn with_strategy(mut self, strategy: RaceStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Labels of the registered providers, in registration order
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Race every provider for `key`
    pub async fn race(&self, key: &str) -> RaceOutcome {
        self.race_with_cancellation(key, &CancellationToken::new())
            .await
    }

    /// Race every provider for `key`, stopping early if `parent` is cancelled
    ///
    /// Each call gets its own deadline and cancellation scope, so one coordinator can
    /// serve concurrent races. All provider tasks have stopped by the time this returns.
    pub async fn race_with_cancellation(
        &self,
        key: &str,
        parent: &CancellationToken,
    ) -> RaceOutcome {
        let started = Instant::now();
        let expiry = sleep(self.deadline);
        let cancellation = parent.child_token();
        let key: Arc<str> = Arc::from(key);

        let mut tasks = JoinSet::new();
        let mut labels = HashMap::with_capacity(self.providers.len());

        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let key = Arc::clone(&key);
            let token = cancellation.clone();
            let name = provider.name();
            let span = info_span!("provider_fetch", provider = name, key = %key);

            let handle = tasks.spawn(
                async move {
                    let result = provider.lookup(&key, &token).await;
                    debug!(
                        elapsed_ms = started.elapsed().as_millis(),
                        success = result.is_ok(),
                        "provider reported"
                    );
                    (name, result)
                }
                .instrument(span),
            );
            labels.insert(handle.id(), name);
        }

        debug!(
            key = %key,
            providers = self.providers.len(),
            deadline_ms = self.deadline.as_millis(),
            strategy = %self.strategy,
            "race started"
        );

        let outcome = self
            .observe(&mut tasks, &labels, expiry, &cancellation)
            .await;

        cancellation.cancel();
        tasks.shutdown().await;

        info!(
            key = %key,
            elapsed_ms = started.elapsed().as_millis(),
            outcome = outcome_label(&outcome),
            provider = outcome.provider().unwrap_or("none"),
            "race resolved"
        );

        outcome
    }

    /// Wait for the first decisive event of a race
    async fn observe(
        &self,
        tasks: &mut JoinSet<(&'static str, Result<Address, ProviderError>)>,
        labels: &HashMap<Id, &'static str>,
        expiry: tokio::time::Sleep,
        cancellation: &CancellationToken,
    ) -> RaceOutcome {
        tokio::pin!(expiry);
        let mut failures = Vec::new();

        loop {
            let event = tokio::select! {
                biased;
                () = cancellation.cancelled() => RaceEvent::Cancelled,
                reported = tasks.join_next() => RaceEvent::Reported(reported),
                () = &mut expiry => RaceEvent::Expired,
            };

            let (provider, result) = match event {
                RaceEvent::Cancelled => {
                    debug!("race cancelled by caller");
                    return RaceOutcome::Cancelled;
                }
                RaceEvent::Expired => {
                    warn!(
                        deadline_ms = self.deadline.as_millis(),
                        failed = failures.len(),
                        "race deadline elapsed"
                    );
                    return RaceOutcome::Timeout {
                        deadline: self.deadline,
                        failures,
                    };
                }
                RaceEvent::Reported(None) => return RaceOutcome::Failure { failures },
                RaceEvent::Reported(Some(Ok(report))) => report,
                RaceEvent::Reported(Some(Err(join_error))) => {
                    let provider = labels.get(&join_error.id()).copied().unwrap_or("unknown");
                    let error = ProviderError::TaskFailed {
                        message: join_error.to_string(),
                    };
                    (provider, Err(error))
                }
            };

            match result {
                Ok(address) => return RaceOutcome::Success { address, provider },
                Err(error) => {
                    warn!(provider, %error, "provider failed");
                    failures.push(ProviderFailure { provider, error });
                    if self.strategy == RaceStrategy::FirstSignal {
                        return RaceOutcome::Failure { failures };
                    }
                }
            }
        }
    }
}

fn outcome_label(outcome: &RaceOutcome) -> &'static str {
    match outcome {
        RaceOutcome::Success { .. } => "success",
        RaceOutcome::Failure { .. } => "failure",
        RaceOutcome::Timeout { .. } => "timeout",
        RaceOutcome::Cancelled => "cancelled",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinator_requires_providers() {
        let result = RaceCoordinator::new(Vec::new(), DEFAULT_DEADLINE);
        assert!(matches!(result, Err(RaceError::NoProviders)));
    }

    #[test]
    fn race_error_display() {
        assert_eq!(
            RaceError::NoProviders.to_string(),
            "No address providers registered"
        );
        assert_eq!(
            RaceError::ZeroDeadline.to_string(),
            "Race deadline must be greater than zero"
        );
    }

    #[test]
    fn strategy_parsing() {
        assert_eq!(
            "first-success".parse::<RaceStrategy>(),
            Ok(RaceStrategy::FirstSuccess)
        );
        assert_eq!(
            " First-Signal ".parse::<RaceStrategy>(),
            Ok(RaceStrategy::FirstSignal)
        );
        assert!("fastest".parse::<RaceStrategy>().is_err());
        assert_eq!(RaceStrategy::default(), RaceStrategy::FirstSuccess);
        assert_eq!(RaceStrategy::FirstSignal.to_string(), "first-signal");
    }

    #[test]
    fn outcome_accessors() {
        let address = Address {
            postal_code: "01001000".to_string(),
            ..Default::default()
        };
        let success = RaceOutcome::Success {
            address,
            provider: "BrasilAPI",
        };
        assert!(success.is_success());
        assert_eq!(success.provider(), Some("BrasilAPI"));
        assert!(success.failures().is_empty());

        let failure = ProviderFailure {
            provider: "ViaCEP",
            error: ProviderError::Cancelled,
        };
        assert_eq!(failure.to_string(), "ViaCEP: lookup cancelled");

        let timeout = RaceOutcome::Timeout {
            deadline: DEFAULT_DEADLINE,
            failures: vec![failure],
        };
        assert!(timeout.is_timeout());
        assert!(timeout.provider().is_none());
        assert_eq!(timeout.failures().len(), 1);
    }
}
