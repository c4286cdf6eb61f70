// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::auth::{credentials::CredentialSources, AuthError, CredentialChain};
use crate::github::ProviderError;
use crate::models::{GitHubHandle, SessionStatusResponse};
use crate::state::AppState;

const SIGNED_OUT: SessionStatusResponse = SessionStatusResponse {
    authenticated: false,
    handle: None,
};

/// Whether the session cookie holds a token GitHub still accepts.
#[utoipa::path(
    get,
    path = "/api/session",
    tag = "Session",
    responses(
        (status = 200, description = "Session state", body = SessionStatusResponse),
        (status = 502, description = "GitHub request failed")
    )
)]
pub async fn session_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionStatusResponse>, AuthError> {
    let sources = CredentialSources {
        headers: &headers,
        query_token: None,
        cipher: &state.cipher,
    };
    let Ok(credential) = CredentialChain::cookie_only().resolve(&sources) else {
        return Ok(Json(SIGNED_OUT));
    };

    match state.provider.fetch_user(&credential.token).await {
        Ok(user) => Ok(Json(SessionStatusResponse {
            authenticated: true,
            handle: GitHubHandle::new(&user.login).ok().map(|h| h.to_string()),
        })),
        Err(ProviderError::Unauthorized) => Ok(Json(SIGNED_OUT)),
        Err(e) => Err(AuthError::UpstreamError(e.to_string())),
    }
}

/// Clear the session cookie.
#[utoipa::path(
    delete,
    path = "/api/session",
    tag = "Session",
    responses(
        (status = 204, description = "Session cookie cleared")
    )
)]
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, state.session_cookie.build_clear_cookie())],
    )
}
