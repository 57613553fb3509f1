// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP plumbing shared by the provider clients
//!
//! Both providers issue a single JSON `GET` whose path embeds the lookup key, so the
//! request building, status handling and cancellation live here once.

use std::time::Duration;

use address_client::ProviderError;
use reqwest::{Client, header::ACCEPT};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// User agent sent with every provider request
pub const DEFAULT_USER_AGENT: &str = concat!("cep-lookup/", env!("CARGO_PKG_VERSION"));

// Longest error body kept from a failed response
const MAX_ERROR_BODY_CHARS: usize = 256;

/// Errors raised while fetching and decoding a provider response
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider answered with a non-success status
    #[error("API error: {status} - {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        message: String,
    },

    /// Request URL could not be built
    #[error("Invalid URL: {0}")]
    Url(String),

    /// Caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,
}

impl From<FetchError> for ProviderError {
    fn from(value: FetchError) -> Self {
        match value {
            FetchError::Http(error) if error.is_decode() => ProviderError::Decode {
                message: error.to_string(),
            },
            FetchError::Http(error) => ProviderError::Transport {
                message: error.to_string(),
            },
            FetchError::Json(error) => ProviderError::Decode {
                message: error.to_string(),
            },
            FetchError::Status { status, message } => ProviderError::Status { status, message },
            FetchError::Url(message) => ProviderError::InvalidUrl { message },
            FetchError::Cancelled => ProviderError::Cancelled,
        }
    }
}

/// Build the HTTP client used by a provider
pub(crate) fn build_client(timeout_seconds: u64) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(DEFAULT_USER_AGENT)
        .build()
}

/// Parse and check a configured base URL
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, String> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err("Base URL cannot be empty".to_string());
    }

    let url = Url::parse(trimmed).map_err(|e| format!("Invalid base URL {trimmed}: {e}"))?;
    if url.cannot_be_a_base() {
        return Err(format!("Base URL {trimmed} cannot carry a path"));
    }

    Ok(url)
}

/// Append `segments` to `base`, percent-encoding each one as a single path segment
///
/// A trailing empty segment produces a trailing slash. Dot segments are rejected since
/// they would be resolved away instead of encoded.
pub(crate) fn lookup_url(base: &Url, segments: &[&str]) -> Result<Url, FetchError> {
    if let Some(dot) = segments.iter().find(|s| matches!(**s, "." | "..")) {
        return Err(FetchError::Url(format!(
            "path segment '{dot}' cannot be used in a lookup URL"
        )));
    }

    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| FetchError::Url(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Issue a `GET` for `url` and decode the JSON body into `T`
///
/// The request future is dropped as soon as `cancellation` fires, which aborts the
/// underlying connection.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    client: &Client,
    url: Url,
    cancellation: &CancellationToken,
) -> Result<T, FetchError> {
    let request = async {
        debug!(%url, "sending provider request");

        let response = client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            if let Some((cut, _)) = message.char_indices().nth(MAX_ERROR_BODY_CHARS) {
                message.truncate(cut);
            }
            warn!(%url, status = status.as_u16(), "provider returned an error status");
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    };

    tokio::select! {
        biased;
        () = cancellation.cancelled() => {
            debug!(%url, "provider request cancelled");
            Err(FetchError::Cancelled)
        }
        result = request => result,
    }
}
