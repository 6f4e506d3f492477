// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The SQL Lock Store: Run, State, and Execution leases with TTL,
//! heartbeat, owner identity, and stale-process reclamation.

use crate::migrations;
use crate::process::is_process_alive;
use chrono::{DateTime, Duration, Utc};
use deespec_core::lock::{ExecutionLock, LockBase, LockType, RunLock, StateLock};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockStoreError {
    #[error("lock not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Migration(#[from] migrations::MigrationError),
    #[error("sql error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("metadata serialization error: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Which lock table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    Run,
    State,
    Execution,
}

impl LockKind {
    fn table(self) -> &'static str {
        match self {
            LockKind::Run => "run_locks",
            LockKind::State => "state_locks",
            LockKind::Execution => "execution_locks",
        }
    }
}

/// Who is acquiring or renewing a lock.
#[derive(Debug, Clone)]
pub struct Holder {
    pub pid: u32,
    pub hostname: String,
}

pub struct LockStore {
    conn: Mutex<Connection>,
}

impl LockStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LockStoreError> {
        let mut conn = Connection::open(path)?;
        migrations::run(&mut conn, &migrations::bundled())?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, LockStoreError> {
        let mut conn = Connection::open_in_memory()?;
        migrations::run(&mut conn, &migrations::bundled())?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs `f` inside a transaction on the store's shared connection, so
    /// callers can compose a lock acquisition with other persistence
    /// atomically. This is the store's ambient-transaction entry point:
    /// operations elsewhere in the crate take a plain `&Connection` and
    /// work identically whether that's this transaction or a bare handle.
    pub fn with_transaction<T>(
        &self,
        f: impl FnOnce(&Transaction) -> Result<T, LockStoreError>,
    ) -> Result<T, LockStoreError> {
        let mut guard = self.conn.lock();
        let tx = guard.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    pub fn acquire_run_lock(
        &self,
        lock_id: &str,
        ttl: Duration,
        now: DateTime<Utc>,
        holder: &Holder,
    ) -> Result<Option<RunLock>, LockStoreError> {
        let guard = self.conn.lock();
        acquire_run_lock_on(&guard, lock_id, ttl, now, holder)
    }

    pub fn acquire_state_lock(
        &self,
        lock_id: &str,
        lock_type: LockType,
        ttl: Duration,
        now: DateTime<Utc>,
        holder: &Holder,
    ) -> Result<Option<StateLock>, LockStoreError> {
        let guard = self.conn.lock();
        acquire_state_lock_on(&guard, lock_id, lock_type, ttl, now, holder)
    }

    pub fn acquire_execution_lock(
        &self,
        lock_id: &str,
        ttl: Duration,
        now: DateTime<Utc>,
        holder: &Holder,
    ) -> Result<Option<ExecutionLock>, LockStoreError> {
        let guard = self.conn.lock();
        acquire_execution_lock_on(&guard, lock_id, ttl, now, holder)
    }

    pub fn release(&self, kind: LockKind, lock_id: &str) -> Result<(), LockStoreError> {
        let guard = self.conn.lock();
        release_on(&guard, kind, lock_id)
    }

    pub fn update_heartbeat(
        &self,
        kind: LockKind,
        lock_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), LockStoreError> {
        let guard = self.conn.lock();
        update_heartbeat_on(&guard, kind, lock_id, now)
    }

    pub fn extend(&self, kind: LockKind, lock_id: &str, by: Duration) -> Result<(), LockStoreError> {
        let guard = self.conn.lock();
        extend_on(&guard, kind, lock_id, by)
    }

    pub fn cleanup_expired(&self, kind: LockKind, now: DateTime<Utc>) -> Result<usize, LockStoreError> {
        let guard = self.conn.lock();
        cleanup_expired_on(&guard, kind, now)
    }

    pub fn list_bases(&self, kind: LockKind) -> Result<Vec<LockBase>, LockStoreError> {
        let guard = self.conn.lock();
        list_bases_on(&guard, kind)
    }
}

fn base_from_row(row: &rusqlite::Row, lock_id_idx: usize) -> rusqlite::Result<LockBase> {
    Ok(LockBase {
        lock_id: row.get(lock_id_idx)?,
        pid: row.get(lock_id_idx + 1)?,
        hostname: row.get(lock_id_idx + 2)?,
        acquired_at: row.get(lock_id_idx + 3)?,
        expires_at: row.get(lock_id_idx + 4)?,
        heartbeat_at: row.get(lock_id_idx + 5)?,
    })
}

/// Reads the stored row for `lock_id`, if any, returning its base fields
/// only (kind-specific columns are read by the caller's own query).
fn existing_base(conn: &Connection, kind: LockKind, lock_id: &str) -> Result<Option<LockBase>, LockStoreError> {
    let sql = format!(
        "SELECT lock_id, pid, hostname, acquired_at, expires_at, heartbeat_at FROM {} WHERE lock_id = ?1",
        kind.table()
    );
    let base = conn
        .query_row(&sql, [lock_id], |row| base_from_row(row, 0))
        .optional()?;
    Ok(base)
}

/// The shared stale-reclaim-then-insert dance, parameterized by a closure
/// that does the kind-specific `INSERT`. Returns `true` if this call's
/// insert won the row.
fn reclaim_stale_and_insert(
    conn: &Connection,
    kind: LockKind,
    lock_id: &str,
    now: DateTime<Utc>,
    holder: &Holder,
    insert: impl Fn(&Connection) -> rusqlite::Result<usize>,
) -> Result<bool, LockStoreError> {
    match insert(conn) {
        Ok(_) => return Ok(true),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation => {}
        Err(e) => return Err(e.into()),
    }

    // A row already exists. Determine staleness and, if stale, delete
    // it with a predicate narrow enough not to race a live holder, then
    // retry the insert once.
    let existing = existing_base(conn, kind, lock_id)?;
    let Some(existing) = existing else {
        // Raced: the conflicting row vanished between insert and lookup.
        return Ok(match insert(conn) {
            Ok(_) => true,
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                false
            }
            Err(e) => return Err(e.into()),
        });
    };

    let stale = existing.is_stale(now, &holder.hostname, is_process_alive);
    if !stale {
        return Ok(false);
    }

    let delete_sql = format!(
        "DELETE FROM {} WHERE lock_id = ?1 AND (expires_at < ?2 OR pid = ?3)",
        kind.table()
    );
    conn.execute(&delete_sql, rusqlite::params![lock_id, now, existing.pid])?;

    match insert(conn) {
        Ok(_) => Ok(true),
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

fn acquire_run_lock_on(
    conn: &Connection,
    lock_id: &str,
    ttl: Duration,
    now: DateTime<Utc>,
    holder: &Holder,
) -> Result<Option<RunLock>, LockStoreError> {
    let expires_at = now + ttl;
    let metadata_json = serde_json::to_string(&HashMap::<String, String>::new())?;
    let won = reclaim_stale_and_insert(conn, LockKind::Run, lock_id, now, holder, |conn| {
        conn.execute(
            "INSERT INTO run_locks (lock_id, pid, hostname, acquired_at, expires_at, heartbeat_at, metadata_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?4, ?6)",
            rusqlite::params![lock_id, holder.pid, holder.hostname, now, expires_at, metadata_json],
        )
    })?;
    if !won {
        return Ok(None);
    }
    Ok(Some(RunLock {
        base: LockBase {
            lock_id: lock_id.to_string(),
            pid: holder.pid,
            hostname: holder.hostname.clone(),
            acquired_at: now,
            heartbeat_at: now,
            expires_at,
        },
        metadata: HashMap::new(),
    }))
}

/// Exposed so callers in other crates can compose a state-lock acquisition
/// with their own writes inside [`LockStore::with_transaction`].
pub fn acquire_state_lock_on(
    conn: &Connection,
    lock_id: &str,
    lock_type: LockType,
    ttl: Duration,
    now: DateTime<Utc>,
    holder: &Holder,
) -> Result<Option<StateLock>, LockStoreError> {
    let expires_at = now + ttl;
    let lock_type_str = match lock_type {
        LockType::Read => "READ",
        LockType::Write => "WRITE",
    };
    let won = reclaim_stale_and_insert(conn, LockKind::State, lock_id, now, holder, |conn| {
        conn.execute(
            "INSERT INTO state_locks (lock_id, pid, hostname, lock_type, acquired_at, expires_at, heartbeat_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?5)",
            rusqlite::params![lock_id, holder.pid, holder.hostname, lock_type_str, now, expires_at],
        )
    })?;
    if !won {
        return Ok(None);
    }
    Ok(Some(StateLock {
        base: LockBase {
            lock_id: lock_id.to_string(),
            pid: holder.pid,
            hostname: holder.hostname.clone(),
            acquired_at: now,
            heartbeat_at: now,
            expires_at,
        },
        lock_type,
    }))
}

fn acquire_execution_lock_on(
    conn: &Connection,
    lock_id: &str,
    ttl: Duration,
    now: DateTime<Utc>,
    holder: &Holder,
) -> Result<Option<ExecutionLock>, LockStoreError> {
    let expires_at = now + ttl;
    let won = reclaim_stale_and_insert(conn, LockKind::Execution, lock_id, now, holder, |conn| {
        conn.execute(
            "INSERT INTO execution_locks (lock_id, pid, hostname, acquired_at, expires_at, heartbeat_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?4)",
            rusqlite::params![lock_id, holder.pid, holder.hostname, now, expires_at],
        )
    })?;
    if !won {
        return Ok(None);
    }
    Ok(Some(ExecutionLock {
        base: LockBase {
            lock_id: lock_id.to_string(),
            pid: holder.pid,
            hostname: holder.hostname.clone(),
            acquired_at: now,
            heartbeat_at: now,
            expires_at,
        },
    }))
}

fn release_on(conn: &Connection, kind: LockKind, lock_id: &str) -> Result<(), LockStoreError> {
    let sql = format!("DELETE FROM {} WHERE lock_id = ?1", kind.table());
    let affected = conn.execute(&sql, [lock_id])?;
    if affected == 0 {
        return Err(LockStoreError::NotFound(lock_id.to_string()));
    }
    Ok(())
}

fn update_heartbeat_on(
    conn: &Connection,
    kind: LockKind,
    lock_id: &str,
    now: DateTime<Utc>,
) -> Result<(), LockStoreError> {
    let sql = format!("UPDATE {} SET heartbeat_at = ?1 WHERE lock_id = ?2", kind.table());
    let affected = conn.execute(&sql, rusqlite::params![now, lock_id])?;
    if affected == 0 {
        return Err(LockStoreError::NotFound(lock_id.to_string()));
    }
    Ok(())
}

/// Extends `expires_at` by `by`, added to the *current* expiry rather than
/// to `now` — drift from the original acquisition accumulates rather than
/// compounds.
/// Exposed alongside [`acquire_state_lock_on`] for the same cross-crate
/// transaction composition.
pub fn extend_on(conn: &Connection, kind: LockKind, lock_id: &str, by: Duration) -> Result<(), LockStoreError> {
    let select_sql = format!("SELECT expires_at FROM {} WHERE lock_id = ?1", kind.table());
    let current: Option<DateTime<Utc>> = conn
        .query_row(&select_sql, [lock_id], |row| row.get(0))
        .optional()?;
    let Some(current) = current else {
        return Err(LockStoreError::NotFound(lock_id.to_string()));
    };
    let new_expiry = current + by;
    let update_sql = format!("UPDATE {} SET expires_at = ?1 WHERE lock_id = ?2", kind.table());
    conn.execute(&update_sql, rusqlite::params![new_expiry, lock_id])?;
    Ok(())
}

fn cleanup_expired_on(conn: &Connection, kind: LockKind, now: DateTime<Utc>) -> Result<usize, LockStoreError> {
    let sql = format!("DELETE FROM {} WHERE expires_at < ?1", kind.table());
    Ok(conn.execute(&sql, [now])?)
}

fn list_bases_on(conn: &Connection, kind: LockKind) -> Result<Vec<LockBase>, LockStoreError> {
    let sql = format!(
        "SELECT lock_id, pid, hostname, acquired_at, expires_at, heartbeat_at FROM {} ORDER BY acquired_at DESC",
        kind.table()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| base_from_row(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
