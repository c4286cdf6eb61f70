// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_server::{tls_rustls::RustlsConfig, Handle};
use profile_verifier_server::{
    api::router,
    config::{ConfigError, ServerConfig, SessionKeyMode, TlsConfig, LOG_FORMAT_ENV},
    github::{GitHubClient, ProviderError},
    ledger::{ChainLedger, LedgerError},
    state::AppState,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How long in-flight TLS requests may run after shutdown starts.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("GitHub client: {0}")]
    GitHub(#[from] ProviderError),

    #[error("Ledger client: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("Failed to load TLS certificate: {0}")]
    Tls(std::io::Error),

    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server terminated");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run() -> Result<(), StartupError> {
    let config = ServerConfig::from_env()?;
    log_configuration(&config);

    let addr = config.bind_address()?;
    let tls = config.tls.clone();
    let provider = Arc::new(GitHubClient::new(config.github.clone())?);
    let ledger = config.ledger.as_ref().map(ChainLedger::new).transpose()?;

    let mut state = AppState::new(config, provider);
    if let Some(ledger) = ledger {
        state = state.with_ledger(Arc::new(ledger));
    }
    let app = router(state);

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    match tls {
        Some(tls) => serve_tls(addr, &tls, app, shutdown).await,
        None => serve_plain(addr, app, shutdown).await,
    }
}

fn log_configuration(config: &ServerConfig) {
    tracing::info!(
        environment = config.environment.as_str(),
        frontend_url = %config.frontend_url,
        "Configuration loaded"
    );

    if config.github.is_configured() {
        tracing::info!("GitHub OAuth credentials configured");
    } else {
        tracing::warn!(
            "GITHUB_CLIENT_ID / GITHUB_CLIENT_SECRET not set; the OAuth flow is unavailable"
        );
    }

    match &config.ledger {
        None => tracing::warn!("Ledger not configured; verification status endpoints answer 503"),
        Some(ledger) if config.ledger_can_write() => tracing::info!(
            contract = %ledger.contract_address,
            "Ledger writes enabled"
        ),
        Some(ledger) => tracing::warn!(
            contract = %ledger.contract_address,
            "VERIFIER_PRIVATE_KEY not set; callbacks skip on-chain recording (development mode)"
        ),
    }

    if config.session_key_mode == SessionKeyMode::Ephemeral {
        tracing::warn!(
            "Using an ephemeral session key (ALLOW_INSECURE_SESSION_KEY); sessions will not survive a restart"
        );
    }
}

async fn wait_for_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}

async fn serve_plain(
    addr: SocketAddr,
    app: Router,
    shutdown: CancellationToken,
) -> Result<(), StartupError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;

    tracing::info!("Profile verifier listening on http://{addr} (docs at /docs)");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(StartupError::Serve)
}

/// Server handle that stops accepting on cancellation and lets in-flight
/// requests finish within `drain`.
fn drain_on_cancel(shutdown: CancellationToken, drain: Duration) -> Handle<SocketAddr> {
    let handle = Handle::new();
    tokio::spawn({
        let handle = handle.clone();
        async move {
            shutdown.cancelled().await;
            handle.graceful_shutdown(Some(drain));
        }
    });
    handle
}

async fn serve_tls(
    addr: SocketAddr,
    tls: &TlsConfig,
    app: Router,
    shutdown: CancellationToken,
) -> Result<(), StartupError> {
    // Several crates pull in rustls; pick ring explicitly. Already installed is fine.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let tls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(StartupError::Tls)?;

    tracing::info!("Profile verifier listening on https://{addr} (docs at /docs)");
    axum_server::bind_rustls(addr, tls_config)
        .handle(drain_on_cancel(shutdown, TLS_DRAIN_TIMEOUT))
        .serve(app.into_make_service())
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::routing::get;

    use super::*;

    async fn slow() -> &'static str {
        tokio::time::sleep(Duration::from_millis(300)).await;
        "done"
    }

    #[tokio::test]
    async fn cancellation_drains_in_flight_requests() {
        let shutdown = CancellationToken::new();
        let handle = drain_on_cancel(shutdown.clone(), Duration::from_secs(5));
        let app = Router::new().route("/slow", get(slow));

        let server = tokio::spawn(
            axum_server::bind("127.0.0.1:0".parse::<SocketAddr>().unwrap())
                .handle(handle.clone())
                .serve(app.into_make_service()),
        );
        let addr = handle.listening().await.unwrap();

        let request = tokio::spawn(reqwest::get(format!("http://{addr}/slow")));
        tokio::time::sleep(Duration::from_millis(100)).await;
        shutdown.cancel();

        let response = request.await.unwrap().unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(response.text().await.unwrap(), "done");
        server.await.unwrap().unwrap();
    }
}
