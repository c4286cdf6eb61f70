// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures used by the REST API, plus the two value
//! types every endpoint keys on.
//!
//! ## Wallet Addresses
//!
//! Wallets are `0x` followed by 40 hexadecimal characters (20 bytes). Parsing
//! is checksum-agnostic: `0xABCD…`, `0xabcd…` and the EIP-55 form are the same
//! address.
//!
//! ## GitHub Handles
//!
//! GitHub treats logins case-insensitively, so [`GitHubHandle`] lowercases on
//! construction. Two requests differing only in handle case always resolve to
//! the same record.

use std::fmt;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// =============================================================================
// Wallet Address
// =============================================================================

/// Wallet address parse failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address must start with 0x")]
    MissingPrefix,
    #[error("address must be 40 hexadecimal characters after 0x")]
    InvalidFormat,
}

/// Parse a `0x`-prefixed 20-byte hex address, ignoring checksum casing.
pub fn parse_wallet_address(raw: &str) -> Result<Address, AddressError> {
    let hex = raw
        .trim()
        .strip_prefix("0x")
        .or_else(|| raw.trim().strip_prefix("0X"))
        .ok_or(AddressError::MissingPrefix)?;

    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AddressError::InvalidFormat);
    }

    let bytes = alloy::hex::decode(hex).map_err(|_| AddressError::InvalidFormat)?;
    Ok(Address::from_slice(&bytes))
}

// =============================================================================
// GitHub Handle
// =============================================================================

/// Maximum GitHub login length.
const MAX_HANDLE_LEN: usize = 39;

/// Lowercased GitHub login.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GitHubHandle(String);

/// GitHub handle validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("GitHub handle must be 1-39 characters of letters, digits or '-'")]
pub struct InvalidHandle;

impl GitHubHandle {
    pub fn new(raw: &str) -> Result<Self, InvalidHandle> {
        let trimmed = raw.trim();
        let valid = !trimmed.is_empty()
            && trimmed.len() <= MAX_HANDLE_LEN
            && !trimmed.starts_with('-')
            && trimmed.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-');
        if !valid {
            return Err(InvalidHandle);
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GitHubHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for GitHubHandle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// OAuth
// =============================================================================

/// Query parameters for `GET /api/auth/{provider}`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuthorizationQuery {
    /// Wallet address requesting verification (required).
    pub wallet: Option<String>,
    /// Relative path to redirect to after a successful verification.
    pub redirect: Option<String>,
}

/// Authorization URL for the single-page app to navigate to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthorizationUrlResponse {
    /// GitHub authorize URL including the CSRF `state`.
    pub url: String,
}

/// Query parameters GitHub sends to the callback.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by GitHub when the user denies consent.
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Validate a post-verification redirect: relative, same-origin paths only.
/// The path lands in a `Location` header verbatim, so it must already be
/// ASCII (clients percent-encode anything else).
pub fn is_relative_redirect(path: &str) -> bool {
    path.is_ascii()
        && path.starts_with('/')
        && !path.starts_with("//")
        && !path.contains('\\')
        && !path.chars().any(char::is_control)
}

// =============================================================================
// Resources
// =============================================================================

/// Legacy query-only credential.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TokenQuery {
    /// GitHub access token.
    pub token: Option<String>,
}

// =============================================================================
// Verification
// =============================================================================

/// On-chain verification state of a wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStatusResponse {
    /// Verified GitHub handle (lowercase), `null` when none is recorded.
    pub handle: Option<String>,
    pub verified: bool,
    /// Unix timestamp (seconds) of the verification, 0 when unverified.
    pub verification_timestamp: u64,
}

/// Wallet bound to a GitHub handle.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HandleLookupResponse {
    pub handle: String,
    /// Checksummed wallet address, `null` when the handle is not bound.
    pub wallet: Option<String>,
    pub verified: bool,
}

// =============================================================================
// Session
// =============================================================================

/// Result of `GET /api/session`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}
