// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::SessionKeyMode;
use crate::state::AppState;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// "ok" when client id and secret are set, "missing" otherwise.
    pub github_oauth: String,
    /// "writable", "read_only" or "disabled".
    pub ledger: String,
    /// "configured" or "ephemeral".
    pub session_key: String,
    /// OAuth flows waiting for their callback.
    pub pending_states: usize,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

fn ledger_status(state: &AppState) -> &'static str {
    match &state.ledger {
        Some(ledger) if ledger.can_write() => "writable",
        Some(_) => "read_only",
        None => "disabled",
    }
}

/// Health check endpoint handler.
///
/// Returns 503 when GitHub OAuth credentials are missing. A missing or
/// read-only ledger is reported but does not fail the check.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Service is unhealthy", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let github_ok = state.provider.is_configured();

    let response = ReadyResponse {
        status: if github_ok { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            github_oauth: if github_ok { "ok" } else { "missing" }.to_string(),
            ledger: ledger_status(&state).to_string(),
            session_key: match state.config.session_key_mode {
                SessionKeyMode::Configured => "configured",
                SessionKeyMode::Ephemeral => "ephemeral",
            }
            .to_string(),
            pending_states: state.states.len(),
        },
    };

    let status = if github_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe handler.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(state: State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    health(state).await
}
