// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0
#![allow(missing_docs)]

//! End-to-end lookups through configuration, coordinator and output rendering

use std::{io::Write, time::Duration};

use cep_lookup::{
    CliError, DeadlineMillis, LookupConfig, lookup,
    output::{exit_status, render_text},
};
use cep_providers::{RaceOutcome, RaceStrategy};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const CEP: &str = "01153000";

fn config_for(brasil_api: &MockServer, viacep: &MockServer) -> LookupConfig {
    let mut config = LookupConfig::default();
    config.brasil_api.base_url = format!("{}/api", brasil_api.uri());
    config.viacep.base_url = viacep.uri();
    config
}

async fn mount_brasil_api(server: &MockServer, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(format!("/api/cep/v1/{CEP}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "cep": CEP,
                    "state": "SP",
                    "city": "São Paulo",
                    "neighborhood": "Barra Funda",
                    "street": "Rua Vitorino Carmilo",
                    "service": "open-cep"
                }))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

async fn mount_viacep(server: &MockServer, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(format!("/ws/{CEP}/json/")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "cep": "01153-000",
                    "logradouro": "Rua Vitorino Carmilo",
                    "complemento": "",
                    "bairro": "Barra Funda",
                    "localidade": "São Paulo",
                    "uf": "SP",
                    "ibge": "3550308",
                    "gia": "1004",
                    "ddd": "11",
                    "siafi": "7107"
                }))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn faster_provider_is_reported() {
    let brasil_api = MockServer::start().await;
    let viacep = MockServer::start().await;
    mount_brasil_api(&brasil_api, Duration::from_millis(400)).await;
    mount_viacep(&viacep, Duration::from_millis(10)).await;

    let outcome = assert_ok!(
        lookup(
            &config_for(&brasil_api, &viacep),
            CEP,
            &CancellationToken::new()
        )
        .await
    );

    assert_eq!(outcome.provider(), Some("ViaCEP"));
    assert_eq!(
        render_text(&outcome),
        "Address (ViaCEP): Rua Vitorino Carmilo, Barra Funda, São Paulo - SP"
    );
    assert_eq!(exit_status(&outcome), 0);
}

#[tokio::test]
async fn slow_providers_time_out() {
    let brasil_api = MockServer::start().await;
    let viacep = MockServer::start().await;
    mount_brasil_api(&brasil_api, Duration::from_secs(2)).await;
    mount_viacep(&viacep, Duration::from_secs(2)).await;

    let mut config = config_for(&brasil_api, &viacep);
    config.deadline_ms = DeadlineMillis::new(100).unwrap();

    let outcome = assert_ok!(lookup(&config, CEP, &CancellationToken::new()).await);

    assert!(outcome.is_timeout());
    assert_eq!(
        render_text(&outcome),
        "Timeout: no provider responded within 100 ms"
    );
    assert_eq!(exit_status(&outcome), 1);
}

#[tokio::test]
async fn first_signal_reports_fast_failure() {
    let brasil_api = MockServer::start().await;
    let viacep = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/cep/v1/{CEP}")))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&brasil_api)
        .await;
    mount_viacep(&viacep, Duration::from_millis(300)).await;

    let mut config = config_for(&brasil_api, &viacep);
    config.strategy = RaceStrategy::FirstSignal;

    let outcome = assert_ok!(lookup(&config, CEP, &CancellationToken::new()).await);

    assert!(matches!(outcome, RaceOutcome::Failure { .. }));
    assert_eq!(outcome.failures().len(), 1);
    assert!(render_text(&outcome).starts_with("Error (BrasilAPI):"));
}

#[tokio::test]
async fn cancelled_lookup_reports_cancellation() {
    let brasil_api = MockServer::start().await;
    let viacep = MockServer::start().await;
    mount_brasil_api(&brasil_api, Duration::from_secs(2)).await;
    mount_viacep(&viacep, Duration::from_secs(2)).await;

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let outcome = assert_ok!(lookup(&config_for(&brasil_api, &viacep), CEP, &shutdown).await);

    assert!(matches!(outcome, RaceOutcome::Cancelled));
    assert_eq!(exit_status(&outcome), 130);
}

#[tokio::test]
async fn disabling_every_provider_is_an_error() {
    let mut config = LookupConfig::default();
    config.brasil_api.enabled = false;
    config.viacep.enabled = false;

    let error = assert_err!(lookup(&config, CEP, &CancellationToken::new()).await);
    assert!(matches!(error, CliError::Race(_)));
}

#[test]
fn config_file_overrides_defaults() {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .unwrap();
    write!(
        file,
        r#"{{
            "deadline_ms": 2500,
            "strategy": "first-signal",
            "viacep": {{ "enabled": false }}
        }}"#
    )
    .unwrap();

    let config = LookupConfig::from_env(Some(file.path())).unwrap();

    assert_eq!(config.deadline_ms.value(), 2500);
    assert_eq!(config.strategy, RaceStrategy::FirstSignal);
    assert!(!config.viacep.enabled);
    assert_eq!(config.viacep.base_url, "http://viacep.com.br");
    assert!(config.brasil_api.enabled);
}

#[test]
fn environment_overrides_config_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .unwrap();
    write!(
        file,
        r#"{{ "deadline_ms": 2500, "brasil_api": {{ "base_url": "http://127.0.0.1:8000/api" }} }}"#
    )
    .unwrap();

    let env = [
        ("CEP_DEADLINE_MS", "400"),
        ("CEP_VIACEP__BASE_URL", "http://127.0.0.1:8001"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.to_string()))
    .collect();

    let config = LookupConfig::load_with_env(Some(file.path()), Some(env)).unwrap();

    assert_eq!(config.deadline_ms.value(), 400);
    assert_eq!(config.brasil_api.base_url, "http://127.0.0.1:8000/api");
    assert_eq!(config.viacep.base_url, "http://127.0.0.1:8001");
}

#[test]
fn config_file_rejects_invalid_deadline() {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .unwrap();
    write!(file, r#"{{ "deadline_ms": 0 }}"#).unwrap();

    assert!(matches!(
        LookupConfig::from_env(Some(file.path())),
        Err(CliError::Config { .. })
    ));
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");

    assert!(LookupConfig::from_env(Some(&missing)).is_err());
}
