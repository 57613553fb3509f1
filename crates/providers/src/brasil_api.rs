// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! BrasilAPI integration
//!
//! This module provides an implementation of the `AddressProvider` trait for the
//! BrasilAPI CEP endpoint (`{base}/cep/v1/{cep}`). BrasilAPI aggregates several upstream
//! postal services and answers with an already normalized, English-keyed object.

use address_client::{Address, AddressProvider, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::http::{self, FetchError};

const DEFAULT_BRASIL_API_BASE_URL: &str = "https://brasilapi.com.br/api";
const DEFAULT_BRASIL_API_TIMEOUT_SECONDS: u64 = 10;

/// Configuration for the BrasilAPI client
#[derive(Debug, Clone)]
pub struct BrasilApiConfig {
    /// Base URL for the BrasilAPI service
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for BrasilApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BRASIL_API_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_BRASIL_API_TIMEOUT_SECONDS,
        }
    }
}

/// BrasilAPI client implementation
#[derive(Debug)]
pub struct BrasilApiClient {
    client: Client,
    base_url: Url,
}

/// Errors specific to the BrasilAPI client
#[derive(Debug, Error)]
pub enum BrasilApiError {
    /// Request or decoding failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// BrasilAPI has no record of the CEP
    #[error("CEP not found: {key}")]
    NotFound {
        /// The CEP that was looked up
        key: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<BrasilApiError> for ProviderError {
    fn from(value: BrasilApiError) -> Self {
        match value {
            BrasilApiError::Fetch(error) => error.into(),
            BrasilApiError::NotFound { key } => ProviderError::NotFound { key },
            BrasilApiError::Config(message) => ProviderError::InvalidUrl { message },
        }
    }
}

/// Response body of the BrasilAPI CEP endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BrasilApiResponse {
    /// Postal code
    pub cep: String,
    /// State abbreviation
    pub state: String,
    /// City name
    pub city: String,
    /// Neighborhood name
    pub neighborhood: String,
    /// Street name
    pub street: String,
    /// Upstream service BrasilAPI answered from
    pub service: String,
}

impl From<BrasilApiResponse> for Address {
    fn from(raw: BrasilApiResponse) -> Self {
        Address {
            postal_code: raw.cep,
            street: raw.street,
            neighborhood: raw.neighborhood,
            city: raw.city,
            state: raw.state,
        }
    }
}

impl BrasilApiClient {
    /// Create a new BrasilAPI client
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be created
    pub fn new(config: BrasilApiConfig) -> Result<Self, BrasilApiError> {
        let base_url = http::parse_base_url(&config.base_url).map_err(BrasilApiError::Config)?;
        let client = http::build_client(config.timeout_seconds)
            .map_err(|e| BrasilApiError::Fetch(FetchError::Http(e)))?;

        Ok(Self { client, base_url })
    }

    /// Request URL for a CEP
    pub fn request_url(&self, key: &str) -> Result<Url, BrasilApiError> {
        Ok(http::lookup_url(&self.base_url, &["cep", "v1", key])?)
    }

    /// Fetch the raw BrasilAPI record for a CEP
    ///
    /// # Errors
    ///
    /// Returns `NotFound` on a 404, or the underlying fetch error otherwise
    pub async fn get_cep(
        &self,
        key: &str,
        cancellation: &CancellationToken,
    ) -> Result<BrasilApiResponse, BrasilApiError> {
        let url = self.request_url(key)?;

        match http::fetch_json(&self.client, url, cancellation).await {
            Ok(response) => Ok(response),
            Err(FetchError::Status { status: 404, .. }) => {
                debug!(key, "CEP not found in BrasilAPI");
                Err(BrasilApiError::NotFound {
                    key: key.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl AddressProvider for BrasilApiClient {
    async fn lookup(
        &self,
        key: &str,
        cancellation: &CancellationToken,
    ) -> Result<Address, ProviderError> {
        let response = self.get_cep(key, cancellation).await?;
        info!(key, service = %response.service, "BrasilAPI resolved CEP");
        Ok(response.into())
    }

    fn name(&self) -> &'static str {
        "BrasilAPI"
    }
}
