// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile Verifier - GitHub OAuth relay binding wallets to GitHub handles
//!
//! A wallet starts a GitHub OAuth flow, the callback records the
//! wallet-to-handle binding on the verifier contract and hands the browser an
//! encrypted session cookie holding the GitHub token. The cookie then
//! authorizes a repository proxy that never reveals private repository names.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Credential resolution for the resource proxy
//! - `github` - GitHub OAuth and REST client
//! - `ledger` - Verifier contract client (alloy)
//! - `oauth` - Pending-verification store and callback state machine
//! - `session` - Session cookie cipher and cookie handling

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod github;
pub mod ledger;
pub mod models;
pub mod oauth;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;
