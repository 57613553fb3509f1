// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Postal code provider integrations and the race coordinator
//!
//! This crate provides implementations of the `AddressProvider` trait for the Brazilian
//! CEP lookup services, plus the coordinator that races them against each other.
//!
//! # Architecture
//!
//! - **Client Implementations**: [`brasil_api`], [`viacep`] - one module per service
//! - **Race Coordinator**: [`race::RaceCoordinator`] - runs every provider concurrently
//!   under one deadline and keeps the first address
//! - **HTTP Plumbing**: [`http`] - URL building with path-segment encoding, status
//!   handling and cancellation shared by both clients
//!
//! # Features
//!
//! - **Cancellation**: losing lookups are cancelled through a `CancellationToken` and
//!   their tasks aborted as soon as the race is decided
//! - **Strategies**: first success wins by default; first report of any kind is available
//! - **Testing Support**: integration tests simulate both services with wiremock

pub mod brasil_api;
pub mod http;
pub mod race;
pub mod viacep;

pub use brasil_api::*;
pub use http::FetchError;
pub use race::*;
pub use viacep::*;
