// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for GitHub credentials.
//!
//! ```rust,ignore
//! async fn handler(Credential(credential): Credential) -> impl IntoResponse {
//!     // credential.token is the GitHub access token
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::credentials::{CredentialChain, CredentialSources, ResolvedCredential};
use super::AuthError;
use crate::state::AppState;

/// Credential from the cookie, query or header channel, in that order.
pub struct Credential(pub ResolvedCredential);

/// Credential from the `token` query parameter only.
pub struct QueryCredential(pub ResolvedCredential);

impl FromRequestParts<AppState> for Credential {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_parts(parts, state, &CredentialChain::standard()).map(Credential)
    }
}

impl FromRequestParts<AppState> for QueryCredential {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_parts(parts, state, &CredentialChain::query_only()).map(QueryCredential)
    }
}

/// Run `chain` against the request.
pub fn resolve_parts(
    parts: &Parts,
    state: &AppState,
    chain: &CredentialChain,
) -> Result<ResolvedCredential, AuthError> {
    let query_token = query_token(parts);
    let sources = CredentialSources {
        headers: &parts.headers,
        query_token: query_token.as_deref(),
        cipher: &state.cipher,
    };

    match chain.resolve(&sources) {
        Ok(credential) => {
            tracing::debug!(channel = credential.channel.as_str(), "Credential resolved");
            Ok(credential)
        }
        Err(report) => {
            tracing::debug!(?report, "No credential on any channel");
            Err(AuthError::MissingCredentials(report))
        }
    }
}

fn query_token(parts: &Parts) -> Option<String> {
    let query = parts.uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
}
