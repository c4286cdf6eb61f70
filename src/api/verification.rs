// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::ApiError;
use crate::ledger::VerificationLedger;
use crate::models::{
    parse_wallet_address, GitHubHandle, HandleLookupResponse, VerificationStatusResponse,
};
use crate::state::AppState;

fn ledger(state: &AppState) -> Result<&Arc<dyn VerificationLedger>, ApiError> {
    state
        .ledger
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Ledger is not configured"))
}

/// Verification state of a wallet as recorded on chain.
#[utoipa::path(
    get,
    path = "/api/verify/status/{subject}",
    tag = "Verification",
    params(
        ("subject" = String, Path, description = "Wallet address (0x + 40 hex)")
    ),
    responses(
        (status = 200, description = "Verification state", body = VerificationStatusResponse),
        (status = 400, description = "Invalid wallet address"),
        (status = 502, description = "Ledger read failed"),
        (status = 503, description = "Ledger is not configured")
    )
)]
pub async fn verification_status(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> Result<Json<VerificationStatusResponse>, ApiError> {
    let wallet = parse_wallet_address(&subject)
        .map_err(|e| ApiError::bad_request(format!("Invalid wallet address: {e}")))?;

    let info = ledger(&state)?.wallet_info(wallet).await.map_err(|e| {
        tracing::warn!(wallet = %wallet, error = %e, "Ledger read failed");
        ApiError::bad_gateway(format!("Ledger read failed: {e}"))
    })?;

    Ok(Json(VerificationStatusResponse {
        handle: info.handle,
        verified: info.verified,
        verification_timestamp: info.verification_timestamp,
    }))
}

/// Wallet bound to a GitHub handle. Handles are case-insensitive.
#[utoipa::path(
    get,
    path = "/api/verify/github/{handle}",
    tag = "Verification",
    params(
        ("handle" = String, Path, description = "GitHub login")
    ),
    responses(
        (status = 200, description = "Binding for the handle", body = HandleLookupResponse),
        (status = 400, description = "Invalid handle"),
        (status = 502, description = "Ledger read failed"),
        (status = 503, description = "Ledger is not configured")
    )
)]
pub async fn handle_lookup(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<HandleLookupResponse>, ApiError> {
    let handle = GitHubHandle::new(&handle).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let wallet = ledger(&state)?
        .wallet_for_handle(&handle)
        .await
        .map_err(|e| {
            tracing::warn!(handle = %handle, error = %e, "Ledger read failed");
            ApiError::bad_gateway(format!("Ledger read failed: {e}"))
        })?;

    Ok(Json(HandleLookupResponse {
        handle: handle.to_string(),
        wallet: wallet.map(|w| w.to_checksum(None)),
        verified: wallet.is_some(),
    }))
}
