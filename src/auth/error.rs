// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::credentials::ChannelReport;

/// Authentication error type for the resource proxy.
#[derive(Debug)]
pub enum AuthError {
    /// No channel of the chain produced a token
    MissingCredentials(ChannelReport),
    /// GitHub answered 401 for the supplied token
    AuthenticationExpired,
    /// GitHub failed for any other reason
    UpstreamError(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    channels: Option<ChannelReport>,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials(_) => "missing_credentials",
            AuthError::AuthenticationExpired => "authentication_expired",
            AuthError::UpstreamError(_) => "upstream_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials(_) | AuthError::AuthenticationExpired => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredentials(_) => write!(f, "Missing credentials"),
            AuthError::AuthenticationExpired => write!(f, "Authentication expired"),
            AuthError::UpstreamError(msg) => write!(f, "GitHub request failed: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code().to_string();
        let error = self.to_string();
        let channels = match self {
            AuthError::MissingCredentials(report) => Some(report),
            _ => None,
        };
        (
            status,
            Json(AuthErrorBody {
                error,
                error_code,
                channels,
            }),
        )
            .into_response()
    }
}
