// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};

use crate::auth::{AuthError, Credential, QueryCredential};
use crate::github::{AccessToken, ProviderError, RepositorySummary};
use crate::models::TokenQuery;
use crate::state::AppState;

/// Repositories of `owner`, with the credential taken from the session
/// cookie, the `token` query parameter or the bearer header.
#[utoipa::path(
    get,
    path = "/api/resource/{owner}/authenticated",
    tag = "Resources",
    security(("bearer_auth" = [])),
    params(
        ("owner" = String, Path, description = "GitHub login owning the repositories"),
        TokenQuery
    ),
    responses(
        (status = 200, description = "Repository summary", body = RepositorySummary),
        (status = 401, description = "Missing credentials or authentication expired"),
        (status = 502, description = "GitHub request failed")
    )
)]
pub async fn authenticated_resource(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    Credential(credential): Credential,
) -> Result<Json<RepositorySummary>, AuthError> {
    summarize(&state, &owner, &credential.token).await.map(Json)
}

/// Legacy variant accepting only the `token` query parameter.
#[utoipa::path(
    get,
    path = "/api/resource/{owner}",
    tag = "Resources",
    params(
        ("owner" = String, Path, description = "GitHub login owning the repositories"),
        TokenQuery
    ),
    responses(
        (status = 200, description = "Repository summary", body = RepositorySummary),
        (status = 401, description = "Missing token or authentication expired"),
        (status = 502, description = "GitHub request failed")
    )
)]
pub async fn legacy_resource(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    QueryCredential(credential): QueryCredential,
) -> Result<Json<RepositorySummary>, AuthError> {
    summarize(&state, &owner, &credential.token).await.map(Json)
}

async fn summarize(
    state: &AppState,
    owner: &str,
    token: &AccessToken,
) -> Result<RepositorySummary, AuthError> {
    let repositories = state
        .provider
        .list_repositories(token)
        .await
        .map_err(|e| match e {
            ProviderError::Unauthorized => AuthError::AuthenticationExpired,
            other => {
                tracing::warn!(owner, error = %other, "Repository listing failed");
                AuthError::UpstreamError(other.to_string())
            }
        })?;

    Ok(RepositorySummary::build(owner, &repositories))
}
