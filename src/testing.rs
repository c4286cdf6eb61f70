// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process fakes for the identity provider and the ledger.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, B256};
use async_trait::async_trait;

use crate::config::ServerConfig;
use crate::github::{
    AccessToken, GitHubUser, IdentityProvider, ProviderError, Repository, RepositoryOwner,
};
use crate::ledger::{LedgerError, LedgerReceipt, VerificationLedger, VerificationRecord, WalletVerification};
use crate::models::GitHubHandle;
use crate::state::AppState;

pub const TEST_SESSION_KEY: &str =
    "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

/// Token the fake provider hands out for `validcode`.
pub const VALID_TOKEN: &str = "tok123";

/// Token the fake provider treats as revoked.
pub const EXPIRED_TOKEN: &str = "expired";

/// Token that makes the fake provider fail with a transport error.
pub const BROKEN_TOKEN: &str = "broken";

/// Fake GitHub. Records every token it is called with.
pub struct FakeProvider {
    pub login: String,
    pub repositories: Vec<Repository>,
    configured: bool,
    received: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            login: "Octocat".to_string(),
            repositories: vec![
                repository(42, "secret-repo", true, "Octocat"),
                repository(7, "hello-world", false, "Octocat"),
                repository(9, "someone-elses", false, "hubot"),
            ],
            configured: true,
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    /// Tokens seen by `fetch_user` and `list_repositories`, in call order.
    pub fn received_tokens(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    fn check(&self, token: &AccessToken) -> Result<(), ProviderError> {
        self.received.lock().unwrap().push(token.secret().to_string());
        match token.secret() {
            EXPIRED_TOKEN => Err(ProviderError::Unauthorized),
            BROKEN_TOKEN => Err(ProviderError::Request("connection reset".to_string())),
            _ => Ok(()),
        }
    }
}

pub fn repository(id: u64, name: &str, private: bool, owner: &str) -> Repository {
    Repository {
        id,
        name: name.to_string(),
        private,
        owner: RepositoryOwner {
            login: owner.to_string(),
        },
        description: Some(format!("{name} description")),
        language: Some("Rust".to_string()),
        stargazers_count: 3,
        forks_count: 1,
        updated_at: None,
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn is_configured(&self) -> bool {
        self.configured
    }

    fn authorization_url(&self, state: &str) -> Result<String, ProviderError> {
        if !self.configured {
            return Err(ProviderError::NotConfigured("GITHUB_CLIENT_ID"));
        }
        Ok(format!(
            "https://github.test/login/oauth/authorize?client_id=test-client&scope=read%3Auser+repo&state={state}"
        ))
    }

    async fn exchange_code(&self, code: &str) -> Result<AccessToken, ProviderError> {
        match code {
            "validcode" => Ok(AccessToken::new(VALID_TOKEN)),
            _ => Err(ProviderError::Rejected("bad_verification_code".to_string())),
        }
    }

    async fn fetch_user(&self, token: &AccessToken) -> Result<GitHubUser, ProviderError> {
        self.check(token)?;
        Ok(GitHubUser {
            login: self.login.clone(),
            id: 1,
            name: None,
        })
    }

    async fn list_repositories(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<Repository>, ProviderError> {
        self.check(token)?;
        Ok(self.repositories.clone())
    }
}

/// Fake verifier contract.
pub struct FakeLedger {
    writable: bool,
    fail_writes: bool,
    fail_reads: bool,
    records: Mutex<Vec<VerificationRecord>>,
    bindings: Mutex<HashMap<Address, (String, u64)>>,
}

impl FakeLedger {
    fn with(writable: bool, fail_writes: bool, fail_reads: bool) -> Self {
        Self {
            writable,
            fail_writes,
            fail_reads,
            records: Mutex::new(Vec::new()),
            bindings: Mutex::new(HashMap::new()),
        }
    }

    pub fn writable() -> Self {
        Self::with(true, false, false)
    }

    pub fn read_only() -> Self {
        Self::with(false, false, false)
    }

    pub fn failing() -> Self {
        Self::with(true, true, true)
    }

    /// Pre-populate a binding as if it had been written earlier.
    pub fn bind(&self, wallet: Address, handle: &str, timestamp_secs: u64) {
        self.bindings
            .lock()
            .unwrap()
            .insert(wallet, (handle.to_string(), timestamp_secs));
    }

    pub fn records(&self) -> Vec<VerificationRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl VerificationLedger for FakeLedger {
    fn can_write(&self) -> bool {
        self.writable
    }

    async fn record_verification(
        &self,
        record: &VerificationRecord,
    ) -> Result<LedgerReceipt, LedgerError> {
        if !self.writable {
            return Err(LedgerError::ReadOnly);
        }
        if self.fail_writes {
            return Err(LedgerError::Reverted(B256::ZERO));
        }
        self.records.lock().unwrap().push(record.clone());
        self.bind(record.wallet, record.handle.as_str(), record.timestamp_secs);
        Ok(LedgerReceipt {
            tx_hash: record.verification_hash,
            block_number: Some(1),
        })
    }

    async fn wallet_info(&self, wallet: Address) -> Result<WalletVerification, LedgerError> {
        if self.fail_reads {
            return Err(LedgerError::RpcError("node unreachable".to_string()));
        }
        Ok(match self.bindings.lock().unwrap().get(&wallet) {
            Some((handle, timestamp)) => WalletVerification {
                handle: Some(handle.clone()),
                verified: true,
                verification_timestamp: *timestamp,
            },
            None => WalletVerification::default(),
        })
    }

    async fn wallet_for_handle(
        &self,
        handle: &GitHubHandle,
    ) -> Result<Option<Address>, LedgerError> {
        if self.fail_reads {
            return Err(LedgerError::RpcError("node unreachable".to_string()));
        }
        Ok(self
            .bindings
            .lock()
            .unwrap()
            .iter()
            .find(|(_, (bound, _))| bound == handle.as_str())
            .map(|(wallet, _)| *wallet))
    }
}

/// Configuration with a fixed session key and GitHub credentials.
pub fn test_config() -> ServerConfig {
    config_with(&[])
}

/// `test_config` with extra or overriding variables.
pub fn config_with(overrides: &[(&str, &str)]) -> ServerConfig {
    let mut vars: HashMap<String, String> = [
        ("SESSION_ENCRYPTION_KEY", TEST_SESSION_KEY),
        ("GITHUB_CLIENT_ID", "test-client"),
        ("GITHUB_CLIENT_SECRET", "test-secret"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }
    ServerConfig::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

/// State wired to a fresh [`FakeProvider`] and no ledger.
pub fn test_state() -> AppState {
    AppState::new(test_config(), Arc::new(FakeProvider::new()))
}

/// Same as `test_state`, also returning the provider for inspection.
pub fn test_state_with_provider() -> (AppState, Arc<FakeProvider>) {
    let provider = Arc::new(FakeProvider::new());
    (AppState::new(test_config(), provider.clone()), provider)
}
