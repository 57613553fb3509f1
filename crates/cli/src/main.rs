// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! CEP lookup
//!
//! Races BrasilAPI against ViaCEP and prints whichever address arrives first.

use std::process::ExitCode;

use anyhow::Result;
use cep_lookup::{
    Cli, LookupConfig, lookup,
    output::{exit_code, render_json, render_text},
};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.apply(LookupConfig::from_env(cli.config.as_deref())?)?;

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal_handler(shutdown.clone()));

    let outcome = lookup(&config, &cli.cep, &shutdown).await?;
    shutdown.cancel();

    if cli.json {
        println!("{}", render_json(&outcome)?);
    } else {
        println!("{}", render_text(&outcome));
    }

    Ok(exit_code(&outcome))
}

/// Cancel `shutdown` on Ctrl+C, or exit once the lookup is done
async fn shutdown_signal_handler(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            warn!("Received CTRL+C signal, cancelling lookup");
            shutdown.cancel();
        }
        () = shutdown.cancelled() => {}
    }
}
