// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Rendering of race outcomes for the terminal

use std::process::ExitCode;

use address_client::Address;
use cep_providers::{ProviderFailure, RaceOutcome};
use serde::Serialize;

use crate::error::CliResult;

const FAILURE_STATUS: u8 = 1;
// Conventional exit status for an interrupted process
const INTERRUPTED_STATUS: u8 = 130;

#[derive(Debug, Serialize)]
struct FailureReport {
    provider: &'static str,
    error: String,
}

/// Machine readable form of a race outcome
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Report<'a> {
    Success {
        provider: &'static str,
        address: &'a Address,
    },
    Failure {
        errors: Vec<FailureReport>,
    },
    Timeout {
        deadline_ms: u64,
        errors: Vec<FailureReport>,
    },
    Cancelled,
}

fn failure_reports(failures: &[ProviderFailure]) -> Vec<FailureReport> {
    failures
        .iter()
        .map(|failure| FailureReport {
            provider: failure.provider,
            error: failure.error.to_string(),
        })
        .collect()
}

/// Human readable line describing `outcome`
pub fn render_text(outcome: &RaceOutcome) -> String {
    match outcome {
        RaceOutcome::Success { address, provider } => format!("Address ({provider}): {address}"),
        RaceOutcome::Failure { failures } => match failures.as_slice() {
            [single] => format!("Error ({}): {}", single.provider, single.error),
            many => format!(
                "Error: all providers failed ({})",
                many.iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ")
            ),
        },
        RaceOutcome::Timeout { deadline, .. } => format!(
            "Timeout: no provider responded within {} ms",
            deadline.as_millis()
        ),
        RaceOutcome::Cancelled => "Cancelled: lookup interrupted".to_string(),
    }
}

/// JSON document describing `outcome`
///
/// # Errors
///
/// Returns an error if serialization fails
pub fn render_json(outcome: &RaceOutcome) -> CliResult<String> {
    let report = match outcome {
        RaceOutcome::Success { address, provider } => Report::Success {
            provider: *provider,
            address,
        },
        RaceOutcome::Failure { failures } => Report::Failure {
            errors: failure_reports(failures),
        },
        RaceOutcome::Timeout { deadline, failures } => Report::Timeout {
            deadline_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            errors: failure_reports(failures),
        },
        RaceOutcome::Cancelled => Report::Cancelled,
    };

    Ok(serde_json::to_string_pretty(&report)?)
}

/// Numeric exit status for `outcome`
pub fn exit_status(outcome: &RaceOutcome) -> u8 {
    match outcome {
        RaceOutcome::Success { .. } => 0,
        RaceOutcome::Failure { .. } | RaceOutcome::Timeout { .. } => FAILURE_STATUS,
        RaceOutcome::Cancelled => INTERRUPTED_STATUS,
    }
}

/// Process exit code for `outcome`
pub fn exit_code(outcome: &RaceOutcome) -> ExitCode {
    ExitCode::from(exit_status(outcome))
}
