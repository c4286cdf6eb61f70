// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Credential Resolution
//!
//! The resource proxy accepts a GitHub access token on three channels:
//!
//! 1. the encrypted `session_token` cookie set by the OAuth callback
//! 2. a `token` query parameter (legacy clients)
//! 3. an `Authorization: Bearer <token>` header
//!
//! Channels are tried in that order and the first hit wins. Tokens are never
//! logged or echoed back; failures report only the per-channel status.

pub mod credentials;
pub mod error;
pub mod extractor;

pub use credentials::{
    ChannelReport, ChannelStatus, CredentialChain, CredentialChannel, ResolvedCredential,
};
pub use error::AuthError;
pub use extractor::{resolve_parts, Credential, QueryCredential};
