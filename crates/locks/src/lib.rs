// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! SQL-backed distributed lock store: Run, State, and Execution leases
//! with TTL, heartbeat, and stale-process reclamation.

pub mod migrations;
pub mod process;
pub mod store;

pub use process::is_process_alive;
pub use store::{acquire_state_lock_on, extend_on, Holder, LockKind, LockStore, LockStoreError};
