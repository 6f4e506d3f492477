// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn holder() -> Holder {
    Holder {
        pid: std::process::id(),
        hostname: "test-host".to_string(),
    }
}

#[test]
fn acquire_run_lock_succeeds_when_absent() {
    let store = LockStore::open_in_memory().unwrap();
    let now = Utc::now();
    let lock = store
        .acquire_run_lock("deespec.run", Duration::minutes(10), now, &holder())
        .unwrap();
    assert!(lock.is_some());
}

#[test]
fn second_acquire_of_a_live_lock_fails() {
    let store = LockStore::open_in_memory().unwrap();
    let now = Utc::now();
    store
        .acquire_run_lock("deespec.run", Duration::minutes(10), now, &holder())
        .unwrap();
    let second = store
        .acquire_run_lock("deespec.run", Duration::minutes(10), now, &holder())
        .unwrap();
    assert!(second.is_none());
}

#[test]
fn stale_run_lock_reclaim_scenario() {
    let store = LockStore::open_in_memory().unwrap();
    let now = Utc::now();
    let dead_holder = Holder {
        pid: 1,
        hostname: "test-host".to_string(),
    };
    // Insert a row whose expiry is already in the past.
    store
        .acquire_run_lock("deespec.run", Duration::seconds(-1), now - Duration::seconds(2), &dead_holder)
        .unwrap();

    let reclaimed = store
        .acquire_run_lock("deespec.run", Duration::minutes(10), now, &holder())
        .unwrap()
        .expect("stale row should be reclaimed");
    assert_eq!(reclaimed.base.pid, std::process::id());
    assert!(reclaimed.base.expires_at > now);
}

#[test]
fn release_missing_lock_is_not_found() {
    let store = LockStore::open_in_memory().unwrap();
    let err = store.release(LockKind::Run, "nope").unwrap_err();
    assert!(matches!(err, LockStoreError::NotFound(_)));
}

#[test]
fn release_then_reacquire_succeeds() {
    let store = LockStore::open_in_memory().unwrap();
    let now = Utc::now();
    store
        .acquire_run_lock("deespec.run", Duration::minutes(10), now, &holder())
        .unwrap();
    store.release(LockKind::Run, "deespec.run").unwrap();
    let reacquired = store
        .acquire_run_lock("deespec.run", Duration::minutes(10), now, &holder())
        .unwrap();
    assert!(reacquired.is_some());
}

#[test]
fn update_heartbeat_on_missing_lock_is_not_found() {
    let store = LockStore::open_in_memory().unwrap();
    let err = store
        .update_heartbeat(LockKind::Run, "nope", Utc::now())
        .unwrap_err();
    assert!(matches!(err, LockStoreError::NotFound(_)));
}

#[test]
fn extend_adds_to_current_expiry_not_now() {
    let store = LockStore::open_in_memory().unwrap();
    let now = Utc::now();
    store
        .acquire_run_lock("deespec.run", Duration::minutes(10), now, &holder())
        .unwrap();
    store.extend(LockKind::Run, "deespec.run", Duration::minutes(10)).unwrap();
    let bases = store.list_bases(LockKind::Run).unwrap();
    let row = &bases[0];
    assert_eq!(row.expires_at, now + Duration::minutes(20));
}

#[test]
fn cleanup_expired_removes_only_expired_rows() {
    let store = LockStore::open_in_memory().unwrap();
    let now = Utc::now();
    store
        .acquire_run_lock("keep", Duration::minutes(10), now, &holder())
        .unwrap();
    store
        .acquire_state_lock(
            "expired",
            LockType::Write,
            Duration::seconds(-5),
            now - Duration::seconds(10),
            &holder(),
        )
        .unwrap();
    let removed = store.cleanup_expired(LockKind::State, now).unwrap();
    assert_eq!(removed, 1);
}

#[test]
fn state_lock_acquire_fails_regardless_of_requested_type_when_held() {
    let store = LockStore::open_in_memory().unwrap();
    let now = Utc::now();
    store
        .acquire_state_lock("path:/a", LockType::Read, Duration::minutes(10), now, &holder())
        .unwrap();
    let second = store
        .acquire_state_lock("path:/a", LockType::Write, Duration::minutes(10), now, &holder())
        .unwrap();
    assert!(second.is_none());
}

#[test]
fn list_bases_orders_by_acquired_at_desc() {
    let store = LockStore::open_in_memory().unwrap();
    let now = Utc::now();
    store
        .acquire_execution_lock("exec-1", Duration::minutes(5), now, &holder())
        .unwrap();
    store
        .acquire_execution_lock("exec-2", Duration::minutes(5), now + Duration::seconds(1), &holder())
        .unwrap();
    let bases = store.list_bases(LockKind::Execution).unwrap();
    assert_eq!(bases[0].lock_id, "exec-2");
    assert_eq!(bases[1].lock_id, "exec-1");
}

#[test]
fn with_transaction_composes_lock_acquisition_atomically() {
    let store = LockStore::open_in_memory().unwrap();
    let now = Utc::now();
    let h = holder();
    let result = store.with_transaction(|tx| acquire_run_lock_on(tx, "deespec.run", Duration::minutes(10), now, &h));
    assert!(result.unwrap().is_some());
}

#[test]
fn open_runs_migrations_against_a_real_file_and_persists_across_handles() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("locks.sqlite3");
    let now = Utc::now();
    {
        let store = LockStore::open(&db_path).unwrap();
        store
            .acquire_run_lock("deespec.run", Duration::minutes(10), now, &holder())
            .unwrap();
    }
    let reopened = LockStore::open(&db_path).unwrap();
    let bases = reopened.list_bases(LockKind::Run).unwrap();
    assert_eq!(bases.len(), 1);
    assert_eq!(bases[0].lock_id, "deespec.run");
}
