// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! On-chain verification ledger.
//!
//! The verifier contract stores one GitHub handle per wallet. The server
//! writes a binding at the end of a successful OAuth callback and reads
//! bindings for the status endpoints.
//!
//! ## Write Capability
//!
//! Writes need `VERIFIER_PRIVATE_KEY`. Without it the ledger is read-only
//! and the callback skips the recording step ("development mode").

pub mod client;
pub mod contract;
pub mod types;

use alloy::primitives::Address;
use async_trait::async_trait;

pub use client::ChainLedger;
pub use types::{
    verification_hash, LedgerError, LedgerReceipt, VerificationRecord, WalletVerification,
};

use crate::models::GitHubHandle;

/// Verifier contract operations.
#[async_trait]
pub trait VerificationLedger: Send + Sync {
    /// A signing key is configured.
    fn can_write(&self) -> bool;

    /// Submit `verifyUserWallet` and wait (bounded) for a successful receipt.
    async fn record_verification(
        &self,
        record: &VerificationRecord,
    ) -> Result<LedgerReceipt, LedgerError>;

    /// `getWalletGitHubInfo(wallet)`.
    async fn wallet_info(&self, wallet: Address) -> Result<WalletVerification, LedgerError>;

    /// `getWalletByGitHub(handle)`; the zero address maps to `None`.
    async fn wallet_for_handle(&self, handle: &GitHubHandle)
        -> Result<Option<Address>, LedgerError>;
}
