// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger types and errors.

use alloy::primitives::{keccak256, Address, B256, U256};

use crate::models::GitHubHandle;

/// A wallet-to-handle binding about to be written on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRecord {
    pub wallet: Address,
    pub handle: GitHubHandle,
    /// Unix seconds.
    pub timestamp_secs: u64,
    pub verification_hash: B256,
}

impl VerificationRecord {
    pub fn new(wallet: Address, handle: GitHubHandle, timestamp_secs: u64) -> Self {
        let verification_hash = verification_hash(wallet, &handle, timestamp_secs);
        Self {
            wallet,
            handle,
            timestamp_secs,
            verification_hash,
        }
    }
}

/// `keccak256(abi.encodePacked(wallet, handle, uint256(timestamp)))`.
pub fn verification_hash(wallet: Address, handle: &GitHubHandle, timestamp_secs: u64) -> B256 {
    let handle = handle.as_str().as_bytes();
    let mut packed = Vec::with_capacity(20 + handle.len() + 32);
    packed.extend_from_slice(wallet.as_slice());
    packed.extend_from_slice(handle);
    packed.extend_from_slice(&U256::from(timestamp_secs).to_be_bytes::<32>());
    keccak256(packed)
}

/// Confirmed verification transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
}

/// On-chain verification state of a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WalletVerification {
    /// Lowercased handle, `None` when the contract holds an empty string.
    pub handle: Option<String>,
    pub verified: bool,
    pub verification_timestamp: u64,
}

/// Ledger client errors.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Ledger is read-only: no signing key configured")]
    ReadOnly,

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Transaction was not confirmed within {0} seconds")]
    ConfirmationTimeout(u64),

    #[error("Transaction {0} reverted")]
    Reverted(B256),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract error: {0}")]
    ContractError(String),
}
