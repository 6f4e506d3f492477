// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parse_filename_extracts_version_and_name() {
    assert_eq!(
        parse_filename("001_run_locks.sql").unwrap(),
        (1, "run_locks".to_string())
    );
}

#[test]
fn parse_filename_rejects_malformed_names() {
    assert!(parse_filename("run_locks.sql").is_err());
    assert!(parse_filename("abc_run_locks.sql").is_err());
}

#[test]
fn run_applies_every_bundled_migration_exactly_once() {
    let mut conn = Connection::open_in_memory().unwrap();
    let files = bundled();
    run(&mut conn, &files).unwrap();
    run(&mut conn, &files).unwrap(); // idempotent

    let applied: u32 = conn
        .query_row("SELECT COUNT(*) FROM schema_migrations", [], |r| r.get(0))
        .unwrap();
    assert_eq!(applied, 3);

    for table in ["run_locks", "state_locks", "execution_locks"] {
        let exists: u32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [table],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(exists, 1, "expected table {table} to exist");
    }
}
