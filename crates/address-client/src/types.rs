// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Normalized address returned by every provider

use std::fmt;

use serde::{Deserialize, Serialize};

/// Address in the common shape all provider responses are mapped into
///
/// Fields are opaque text and may be empty when a provider omits them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Postal code as echoed back by the provider
    pub postal_code: String,
    /// Street name
    pub street: String,
    /// Neighborhood
    pub neighborhood: String,
    /// City
    pub city: String,
    /// State abbreviation
    pub state: String,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {} - {}",
            self.street, self.neighborhood, self.city, self.state
        )
    }
}
