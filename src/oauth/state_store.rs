// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Pending OAuth verifications keyed by CSRF `state`.
//!
//! An entry is created when a wallet starts the GitHub flow and is consumed
//! exactly once by the callback. Entries older than the TTL are never
//! returned, and are swept opportunistically on each new authorization
//! request. There is no background timer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use alloy::primitives::Address;
use chrono::Utc;
use ring::rand::{SecureRandom, SystemRandom};

/// One hour, in line with the session cookie lifetime.
pub const STATE_TTL: Duration = Duration::from_millis(3_600_000);

/// Random bytes in a state token (hex-encoded to 32 characters).
pub const STATE_TOKEN_BYTES: usize = 16;

/// Source of "now" in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now_ms
            .fetch_add(duration_millis(by), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// A wallet waiting for its GitHub callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVerification {
    /// Wallet that started the flow.
    pub wallet: Address,
    /// Creation time (epoch milliseconds).
    pub created_at_ms: i64,
    /// Relative path to send the browser to after success.
    pub redirect_path: Option<String>,
}

impl PendingVerification {
    pub fn is_expired(&self, now_ms: i64, ttl: Duration) -> bool {
        now_ms.saturating_sub(self.created_at_ms) > duration_millis(ttl)
    }
}

/// Storage for pending verifications.
///
/// Implementations must guarantee that `take_if_valid` hands out a given
/// state at most once and never hands out an expired entry.
pub trait StateStore: Send + Sync {
    /// Insert an entry under a freshly minted state token.
    fn put(&self, state: String, entry: PendingVerification);

    /// Remove the entry and return it if it has not expired.
    fn take_if_valid(&self, state: &str) -> Option<PendingVerification>;

    /// Drop entries older than `ttl`. Returns how many were removed.
    fn prune_older_than(&self, ttl: Duration) -> usize;

    /// Number of entries currently held (expired ones included).
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-memory state store.
pub struct InMemoryStateStore {
    entries: Mutex<HashMap<String, PendingVerification>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl InMemoryStateStore {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            ttl,
        }
    }
}

impl StateStore for InMemoryStateStore {
    fn put(&self, state: String, entry: PendingVerification) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(state, entry);
    }

    fn take_if_valid(&self, state: &str) -> Option<PendingVerification> {
        let entry = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.remove(state)?
        };

        if entry.is_expired(self.clock.now_millis(), self.ttl) {
            tracing::debug!(wallet = %entry.wallet, "Discarding expired OAuth state");
            return None;
        }
        Some(entry)
    }

    fn prune_older_than(&self, ttl: Duration) -> usize {
        let now = self.clock.now_millis();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now, ttl));
        before - entries.len()
    }

    fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Mint a new state token: 16 CSPRNG bytes, lowercase hex.
pub fn generate_state_token(rng: &SystemRandom) -> Option<String> {
    let mut bytes = [0u8; STATE_TOKEN_BYTES];
    rng.fill(&mut bytes).ok()?;
    Some(alloy::hex::encode(bytes))
}

fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
