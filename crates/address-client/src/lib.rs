// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Provider trait and normalized address types for postal code lookups
//!
//! This crate holds the pieces every address provider shares, so that the concrete
//! HTTP integrations and the race coordinator can depend on a single contract.
//!
//! # Core Abstractions
//!
//! - **`AddressProvider` Trait**: one lookup per key, cancellable through a `CancellationToken`
//! - **Normalized Address**: [`Address`], the common shape every provider response maps into
//! - **Error Handling**: [`ProviderError`] classifies transport, decode and status failures
//!
//! The trait is object safe (via `async_trait`) so a coordinator can hold a heterogeneous
//! list of providers behind `Arc<dyn AddressProvider>`.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub mod types;

pub use types::*;

/// Common interface for external address lookup services
///
/// Implementations perform exactly one outbound request per call and must stop work
/// as soon as `cancellation` fires.
#[async_trait]
pub trait AddressProvider: Send + Sync + std::fmt::Debug {
    /// Look up the address registered for `key`
    ///
    /// # Arguments
    ///
    /// * `key` - The postal code, passed through verbatim (it is encoded, not validated)
    /// * `cancellation` - Token fired by the caller when the result is no longer wanted
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the provider answers with a non-success
    /// status, the body does not match the provider schema, or the lookup is cancelled
    async fn lookup(
        &self,
        key: &str,
        cancellation: &CancellationToken,
    ) -> Result<Address, ProviderError>;

    /// Stable label of this provider, used in logs and race outcomes
    fn name(&self) -> &'static str;
}

/// Errors a single provider lookup can end with
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum ProviderError {
    /// The provider could not be reached or the connection broke
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The response body did not match the provider schema
    #[error("decode error: {message}")]
    Decode { message: String },

    /// The provider answered with a non-success status
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    /// The provider has no address for the key
    #[error("no address found for {key}")]
    NotFound { key: String },

    /// The request URL could not be built
    #[error("invalid request URL: {message}")]
    InvalidUrl { message: String },

    /// The lookup was abandoned before it completed
    #[error("lookup cancelled")]
    Cancelled,

    /// The task running the lookup stopped abnormally
    #[error("lookup task failed: {message}")]
    TaskFailed { message: String },
}

impl ProviderError {
    /// Whether the failure happened while talking to the provider
    pub fn is_transport(&self) -> bool {
        matches!(self, ProviderError::Transport { .. })
    }

    /// Whether the provider answered but the body could not be decoded
    pub fn is_decode(&self) -> bool {
        matches!(self, ProviderError::Decode { .. })
    }

    /// Whether the lookup ended because it was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProviderError::Cancelled)
    }
}
