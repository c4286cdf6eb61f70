// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! GitHub callback state machine.
//!
//! ```text
//! AwaitingCode -> ExchangingToken -> FetchingIdentity -+-> RecordingOnLedger -+-> IssuingSession -> Redirected
//!                                                      +----------------------+
//! ```
//!
//! Each edge is one function returning the next state or a [`FlowError`].
//! The OAuth `state` is consumed on the very first edge, so a replayed
//! callback fails as [`FlowError::UnknownState`] no matter how far the
//! original one got.

use axum::{
    http::{header::SET_COOKIE, HeaderValue},
    response::{IntoResponse, Redirect, Response},
};

use super::state_store::PendingVerification;
use crate::config::SessionKeyMode;
use crate::error::ApiError;
use crate::github::AccessToken;
use crate::ledger::VerificationRecord;
use crate::models::{CallbackQuery, GitHubHandle};
use crate::state::AppState;

/// Where the callback currently is.
#[derive(Debug)]
pub enum CallbackState {
    AwaitingCode(CallbackQuery),
    ExchangingToken {
        pending: PendingVerification,
        code: String,
    },
    FetchingIdentity {
        pending: PendingVerification,
        access_token: AccessToken,
    },
    RecordingOnLedger {
        pending: PendingVerification,
        access_token: AccessToken,
        handle: GitHubHandle,
    },
    IssuingSession {
        pending: PendingVerification,
        access_token: AccessToken,
        handle: GitHubHandle,
    },
    Redirected(CallbackOutcome),
}

/// Terminal result of a successful callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub location: String,
    /// Full `Set-Cookie` value, absent when encryption failed.
    pub session_cookie: Option<String>,
    pub handle: GitHubHandle,
}

impl IntoResponse for CallbackOutcome {
    fn into_response(self) -> Response {
        let mut response = Redirect::to(&self.location).into_response();
        if let Some(cookie) = self
            .session_cookie
            .and_then(|cookie| HeaderValue::from_str(&cookie).ok())
        {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        response
    }
}

/// Reasons a callback stops early.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Missing code or state")]
    MissingParameters,

    #[error("Invalid or expired state")]
    UnknownState,

    #[error("GitHub authorization failed: {0}")]
    Provider(String),

    #[error("Ledger write failed: {0}")]
    Ledger(String),
}

impl FlowError {
    /// `error` value of the frontend error page, for errors that redirect.
    pub fn redirect_reason(&self) -> Option<&'static str> {
        match self {
            FlowError::MissingParameters | FlowError::UnknownState => None,
            FlowError::Provider(_) => Some("github"),
            FlowError::Ledger(_) => Some("blockchain"),
        }
    }

    /// 400 JSON for request errors, 303 to the frontend error page otherwise.
    pub fn into_response_for(self, frontend_url: &str) -> Response {
        match self.redirect_reason() {
            Some(reason) => {
                Redirect::to(&format!("{frontend_url}/verify/error?error={reason}")).into_response()
            }
            None => ApiError::bad_request(self.to_string()).into_response(),
        }
    }
}

impl CallbackState {
    /// Take one edge.
    pub async fn advance(self, state: &AppState) -> Result<CallbackState, FlowError> {
        match self {
            CallbackState::AwaitingCode(query) => await_code(state, query),
            CallbackState::ExchangingToken { pending, code } => {
                exchange_token(state, pending, code).await
            }
            CallbackState::FetchingIdentity {
                pending,
                access_token,
            } => fetch_identity(state, pending, access_token).await,
            CallbackState::RecordingOnLedger {
                pending,
                access_token,
                handle,
            } => record_on_ledger(state, pending, access_token, handle).await,
            CallbackState::IssuingSession {
                pending,
                access_token,
                handle,
            } => Ok(issue_session(state, pending, access_token, handle)),
            done @ CallbackState::Redirected(_) => Ok(done),
        }
    }
}

/// Drive the machine from `AwaitingCode` to `Redirected`.
pub async fn run_callback(
    state: &AppState,
    query: CallbackQuery,
) -> Result<CallbackOutcome, FlowError> {
    let mut current = CallbackState::AwaitingCode(query);
    loop {
        current = current.advance(state).await?;
        if let CallbackState::Redirected(outcome) = current {
            return Ok(outcome);
        }
    }
}

fn await_code(state: &AppState, query: CallbackQuery) -> Result<CallbackState, FlowError> {
    let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());

    if let Some(error) = non_empty(query.error) {
        // Burn the state so the denied flow cannot be resumed.
        if let Some(pending) = non_empty(query.state).and_then(|s| state.states.take_if_valid(&s)) {
            tracing::info!(wallet = %pending.wallet, error = %error, "GitHub authorization denied");
        }
        let detail = query.error_description.unwrap_or(error);
        return Err(FlowError::Provider(detail));
    }

    let (Some(code), Some(oauth_state)) = (non_empty(query.code), non_empty(query.state)) else {
        return Err(FlowError::MissingParameters);
    };

    let pending = state
        .states
        .take_if_valid(&oauth_state)
        .ok_or(FlowError::UnknownState)?;

    Ok(CallbackState::ExchangingToken { pending, code })
}

async fn exchange_token(
    state: &AppState,
    pending: PendingVerification,
    code: String,
) -> Result<CallbackState, FlowError> {
    let access_token = state.provider.exchange_code(&code).await.map_err(|e| {
        tracing::warn!(wallet = %pending.wallet, error = %e, "Token exchange failed");
        FlowError::Provider(e.to_string())
    })?;

    Ok(CallbackState::FetchingIdentity {
        pending,
        access_token,
    })
}

async fn fetch_identity(
    state: &AppState,
    pending: PendingVerification,
    access_token: AccessToken,
) -> Result<CallbackState, FlowError> {
    let user = state.provider.fetch_user(&access_token).await.map_err(|e| {
        tracing::warn!(wallet = %pending.wallet, error = %e, "Fetching GitHub user failed");
        FlowError::Provider(e.to_string())
    })?;

    let handle = GitHubHandle::new(&user.login).map_err(|e| {
        tracing::warn!(login = %user.login, "GitHub returned an unusable login");
        FlowError::Provider(e.to_string())
    })?;

    if state.writable_ledger().is_some() {
        Ok(CallbackState::RecordingOnLedger {
            pending,
            access_token,
            handle,
        })
    } else {
        tracing::info!(
            wallet = %pending.wallet,
            handle = %handle,
            "Ledger is not writable, skipping on-chain verification (development mode)"
        );
        Ok(CallbackState::IssuingSession {
            pending,
            access_token,
            handle,
        })
    }
}

async fn record_on_ledger(
    state: &AppState,
    pending: PendingVerification,
    access_token: AccessToken,
    handle: GitHubHandle,
) -> Result<CallbackState, FlowError> {
    let Some(ledger) = state.writable_ledger() else {
        return Ok(CallbackState::IssuingSession {
            pending,
            access_token,
            handle,
        });
    };

    let timestamp_secs = u64::try_from(state.clock.now_millis() / 1000).unwrap_or_default();
    let record = VerificationRecord::new(pending.wallet, handle.clone(), timestamp_secs);

    let receipt = ledger.record_verification(&record).await.map_err(|e| {
        tracing::error!(wallet = %pending.wallet, handle = %handle, error = %e, "Ledger write failed");
        FlowError::Ledger(e.to_string())
    })?;

    tracing::info!(
        wallet = %pending.wallet,
        handle = %handle,
        tx_hash = %receipt.tx_hash,
        block_number = ?receipt.block_number,
        "Wallet verified on chain"
    );

    Ok(CallbackState::IssuingSession {
        pending,
        access_token,
        handle,
    })
}

fn issue_session(
    state: &AppState,
    pending: PendingVerification,
    access_token: AccessToken,
    handle: GitHubHandle,
) -> CallbackState {
    if state.config.session_key_mode == SessionKeyMode::Ephemeral {
        tracing::warn!("Issuing a session under an ephemeral key; sessions will not survive a restart");
    }

    let session_cookie = match state.cipher.encrypt(access_token.secret()) {
        Some(packed) => Some(state.session_cookie.build_set_cookie(&packed)),
        None => {
            tracing::error!(handle = %handle, "Session token encryption failed, continuing without a cookie");
            None
        }
    };

    let frontend_url = &state.config.frontend_url;
    let location = match &pending.redirect_path {
        Some(path) => format!("{frontend_url}{path}"),
        None => format!("{frontend_url}/verify/success?username={handle}"),
    };

    CallbackState::Redirected(CallbackOutcome {
        location,
        session_cookie,
        handle,
    })
}
