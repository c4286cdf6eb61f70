// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! GitHub integration.
//!
//! - `client` - OAuth code exchange and REST reads behind [`IdentityProvider`]
//! - `types` - upstream JSON shapes and the redacted [`AccessToken`]
//! - `summary` - repository summary with private names pseudonymized

pub mod client;
pub mod summary;
pub mod types;

pub use client::{GitHubClient, IdentityProvider, ProviderError};
pub use summary::{pseudonym, RepositorySummary, RepositoryView};
pub use types::{AccessToken, GitHubUser, Repository, RepositoryOwner};
