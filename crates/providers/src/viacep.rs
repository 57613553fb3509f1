// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! ViaCEP integration
//!
//! Implements `AddressProvider` for ViaCEP (`{base}/ws/{cep}/json/`). ViaCEP answers in
//! Portuguese field names and reports unknown CEPs with a `200 OK` whose body only
//! carries an `erro` flag, so that case is detected explicitly instead of being decoded
//! into a blank address.

use address_client::{Address, AddressProvider, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::http::{self, FetchError};

// ViaCEP API constants
const DEFAULT_VIACEP_BASE_URL: &str = "http://viacep.com.br";
const DEFAULT_VIACEP_TIMEOUT_SECONDS: u64 = 10;

/// Configuration for the ViaCEP client
#[derive(Debug, Clone)]
pub struct ViaCepConfig {
    /// Base URL for the ViaCEP service
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for ViaCepConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_VIACEP_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_VIACEP_TIMEOUT_SECONDS,
        }
    }
}

/// ViaCEP client implementation
#[derive(Debug)]
pub struct ViaCepClient {
    client: Client,
    base_url: Url,
}

/// Errors specific to the ViaCEP client
#[derive(Debug, Error)]
pub enum ViaCepError {
    /// Request or decoding failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// ViaCEP flagged the CEP as unknown
    #[error("CEP not found: {key}")]
    NotFound {
        /// The CEP that was looked up
        key: String,
    },

    /// ViaCEP rejected the CEP format
    #[error("CEP rejected by ViaCEP: {key}")]
    BadRequest {
        /// The CEP that was looked up
        key: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<ViaCepError> for ProviderError {
    fn from(value: ViaCepError) -> Self {
        match value {
            ViaCepError::Fetch(error) => error.into(),
            ViaCepError::NotFound { key } => ProviderError::NotFound { key },
            ViaCepError::BadRequest { key } => ProviderError::Status {
                status: 400,
                message: format!("invalid CEP {key}"),
            },
            ViaCepError::Config(message) => ProviderError::InvalidUrl { message },
        }
    }
}

/// Response body of the ViaCEP JSON endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ViaCepResponse {
    /// Postal code, formatted `00000-000`
    pub cep: String,
    /// Street name
    pub logradouro: String,
    /// Address complement
    pub complemento: String,
    /// Neighborhood
    pub bairro: String,
    /// City
    pub localidade: String,
    /// State abbreviation
    pub uf: String,
    /// IBGE municipality code
    pub ibge: String,
    /// GIA code (São Paulo only)
    pub gia: String,
    /// Area code
    pub ddd: String,
    /// SIAFI municipality code
    pub siafi: String,
    /// Present when the CEP is unknown; `true` or `"true"` depending on API version
    pub erro: Option<Value>,
}

impl ViaCepResponse {
    /// Whether ViaCEP reported the CEP as unknown
    pub fn is_not_found(&self) -> bool {
        match &self.erro {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

impl From<ViaCepResponse> for Address {
    fn from(raw: ViaCepResponse) -> Self {
        Address {
            postal_code: raw.cep,
            street: raw.logradouro,
            neighborhood: raw.bairro,
            city: raw.localidade,
            state: raw.uf,
        }
    }
}

impl ViaCepClient {
    /// Create a new ViaCEP client
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be created
    pub fn new(config: ViaCepConfig) -> Result<Self, ViaCepError> {
        let base_url = http::parse_base_url(&config.base_url).map_err(ViaCepError::Config)?;
        let client = http::build_client(config.timeout_seconds)
            .map_err(|e| ViaCepError::Fetch(FetchError::Http(e)))?;

        Ok(Self { client, base_url })
    }

    /// Request URL for a CEP
    pub fn request_url(&self, key: &str) -> Result<Url, ViaCepError> {
        Ok(http::lookup_url(
            &self.base_url,
            &["ws", key, "json", ""],
        )?)
    }

    /// Fetch the raw ViaCEP record for a CEP
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when ViaCEP flags the CEP as unknown, `BadRequest` when it
    /// rejects the format, or the underlying fetch error otherwise
    pub async fn get_cep(
        &self,
        key: &str,
        cancellation: &CancellationToken,
    ) -> Result<ViaCepResponse, ViaCepError> {
        let url = self.request_url(key)?;

        let response: ViaCepResponse = match http::fetch_json(&self.client, url, cancellation).await
        {
            Ok(response) => response,
            Err(FetchError::Status { status: 400, .. }) => {
                return Err(ViaCepError::BadRequest {
                    key: key.to_string(),
                });
            }
            Err(FetchError::Status { status: 404, .. }) => {
                return Err(ViaCepError::NotFound {
                    key: key.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if response.is_not_found() {
            debug!(key, "CEP flagged as unknown by ViaCEP");
            return Err(ViaCepError::NotFound {
                key: key.to_string(),
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl AddressProvider for ViaCepClient {
    async fn lookup(
        &self,
        key: &str,
        cancellation: &CancellationToken,
    ) -> Result<Address, ProviderError> {
        let response = self.get_cep(key, cancellation).await?;
        info!(key, ibge = %response.ibge, "ViaCEP resolved CEP");
        Ok(response.into())
    }

    fn name(&self) -> &'static str {
        "ViaCEP"
    }
}
