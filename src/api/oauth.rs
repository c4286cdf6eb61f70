// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};

use crate::error::ApiError;
use crate::github::ProviderError;
use crate::models::{
    is_relative_redirect, parse_wallet_address, AuthorizationQuery, AuthorizationUrlResponse,
    CallbackQuery,
};
use crate::oauth::{generate_state_token, run_callback, PendingVerification, STATE_TTL};
use crate::state::AppState;

/// The only identity provider wired up.
pub const GITHUB_PROVIDER: &str = "github";

fn ensure_supported(provider: &str) -> Result<(), ApiError> {
    if provider == GITHUB_PROVIDER {
        Ok(())
    } else {
        Err(ApiError::not_found("unsupported provider"))
    }
}

/// Start the OAuth flow for a wallet.
///
/// Stores a pending verification under a fresh CSRF `state` and returns the
/// GitHub authorize URL for the browser to navigate to.
#[utoipa::path(
    get,
    path = "/api/auth/{provider}",
    tag = "OAuth",
    params(
        ("provider" = String, Path, description = "Identity provider (only `github`)"),
        AuthorizationQuery
    ),
    responses(
        (status = 200, description = "Authorization URL", body = AuthorizationUrlResponse),
        (status = 400, description = "Invalid wallet address or redirect"),
        (status = 404, description = "Unsupported provider"),
        (status = 503, description = "GitHub OAuth is not configured")
    )
)]
pub async fn initiate(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<AuthorizationQuery>,
) -> Result<Json<AuthorizationUrlResponse>, ApiError> {
    ensure_supported(&provider)?;

    let raw_wallet = query
        .wallet
        .as_deref()
        .filter(|w| !w.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing wallet address"))?;
    let wallet = parse_wallet_address(raw_wallet)
        .map_err(|e| ApiError::bad_request(format!("Invalid wallet address: {e}")))?;

    let redirect_path = match query.redirect.filter(|r| !r.is_empty()) {
        Some(path) if is_relative_redirect(&path) => Some(path),
        Some(_) => return Err(ApiError::bad_request("redirect must be a relative path")),
        None => None,
    };

    let pruned = state.states.prune_older_than(STATE_TTL);
    if pruned > 0 {
        tracing::debug!(pruned, "Pruned expired OAuth states");
    }

    let oauth_state = generate_state_token(&state.rng)
        .ok_or_else(|| ApiError::internal("Failed to generate OAuth state"))?;
    let url = state
        .provider
        .authorization_url(&oauth_state)
        .map_err(|e| match e {
            ProviderError::NotConfigured(_) => {
                ApiError::service_unavailable("GitHub OAuth is not configured")
            }
            other => ApiError::internal(other.to_string()),
        })?;

    state.states.put(
        oauth_state,
        PendingVerification {
            wallet,
            created_at_ms: state.clock.now_millis(),
            redirect_path,
        },
    );
    tracing::info!(wallet = %wallet, "OAuth flow started");

    Ok(Json(AuthorizationUrlResponse { url }))
}

/// GitHub redirects the browser here after consent.
#[utoipa::path(
    get,
    path = "/api/auth/{provider}/callback",
    tag = "OAuth",
    params(
        ("provider" = String, Path, description = "Identity provider (only `github`)"),
        CallbackQuery
    ),
    responses(
        (status = 303, description = "Redirect to the frontend success or error page"),
        (status = 400, description = "Missing parameters or invalid/expired state"),
        (status = 404, description = "Unsupported provider")
    )
)]
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Err(e) = ensure_supported(&provider) {
        return e.into_response();
    }

    match run_callback(&state, query).await {
        Ok(outcome) => {
            tracing::info!(handle = %outcome.handle, "OAuth callback completed");
            outcome.into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "OAuth callback aborted");
            e.into_response_for(&state.config.frontend_url)
        }
    }
}
