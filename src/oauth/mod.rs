// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! GitHub OAuth: pending-verification store and the callback state machine.

pub mod flow;
pub mod state_store;

pub use flow::{run_callback, CallbackOutcome, CallbackState, FlowError};
pub use state_store::{
    generate_state_token, Clock, InMemoryStateStore, ManualClock, PendingVerification,
    StateStore, SystemClock, STATE_TTL,
};
