// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use ring::rand::SystemRandom;

use crate::config::ServerConfig;
use crate::github::IdentityProvider;
use crate::ledger::VerificationLedger;
use crate::oauth::state_store::{Clock, InMemoryStateStore, StateStore, SystemClock, STATE_TTL};
use crate::session::{SessionCookie, TokenCipher};

/// Shared handler state. Cheap to clone; everything heavy is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub clock: Arc<dyn Clock>,
    /// Pending verifications keyed by OAuth `state`.
    pub states: Arc<dyn StateStore>,
    pub cipher: Arc<TokenCipher>,
    pub session_cookie: SessionCookie,
    pub provider: Arc<dyn IdentityProvider>,
    /// `None` when `RPC_URL` / `VERIFIER_CONTRACT_ADDRESS` are unset.
    pub ledger: Option<Arc<dyn VerificationLedger>>,
    pub rng: SystemRandom,
}

impl AppState {
    pub fn new(config: ServerConfig, provider: Arc<dyn IdentityProvider>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cipher = TokenCipher::new(config.session_key.clone());
        let session_cookie = SessionCookie::new(config.environment.is_production());

        Self {
            states: Arc::new(InMemoryStateStore::new(clock.clone(), STATE_TTL)),
            clock,
            cipher: Arc::new(cipher),
            session_cookie,
            provider,
            ledger: None,
            rng: SystemRandom::new(),
            config: Arc::new(config),
        }
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn VerificationLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Replace the clock. The state store is rebuilt on the new clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.states = Arc::new(InMemoryStateStore::new(clock.clone(), STATE_TTL));
        self.clock = clock;
        self
    }

    /// Ledger that accepts writes, if any.
    pub fn writable_ledger(&self) -> Option<&Arc<dyn VerificationLedger>> {
        self.ledger.as_ref().filter(|ledger| ledger.can_write())
    }
}
