// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bootstrap migrator: applies ordered `NNN_name.sql` files once each,
//! recording progress in `schema_migrations`.

use rusqlite::Connection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("sql error applying migration {name}: {source}")]
    Sql {
        name: String,
        source: rusqlite::Error,
    },
    #[error("migration filename {0} is not in NNN_name.sql form")]
    BadName(String),
}

/// One migration file: its version number, name, and SQL body.
pub struct MigrationFile {
    pub version: u32,
    pub name: String,
    pub sql: String,
}

/// Parses a `NNN_name.sql` filename into `(version, name)`.
pub fn parse_filename(filename: &str) -> Result<(u32, String), MigrationError> {
    let stem = filename.strip_suffix(".sql").unwrap_or(filename);
    let (num, name) = stem
        .split_once('_')
        .ok_or_else(|| MigrationError::BadName(filename.to_string()))?;
    let version: u32 = num
        .parse()
        .map_err(|_| MigrationError::BadName(filename.to_string()))?;
    Ok((version, name.to_string()))
}

const SCHEMA_MIGRATIONS_DDL: &str = "
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    name       TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);
";

/// Applies every migration in `files` (already sorted by version) that
/// isn't yet recorded in `schema_migrations`, each in its own transaction.
pub fn run(conn: &mut Connection, files: &[MigrationFile]) -> Result<(), MigrationError> {
    conn.execute_batch(SCHEMA_MIGRATIONS_DDL)
        .map_err(|source| MigrationError::Sql {
            name: "schema_migrations bootstrap".to_string(),
            source,
        })?;

    for file in files {
        let already_applied: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = ?1)",
                [file.version],
                |row| row.get(0),
            )
            .map_err(|source| MigrationError::Sql {
                name: file.name.clone(),
                source,
            })?;
        if already_applied {
            continue;
        }

        let tx = conn.transaction().map_err(|source| MigrationError::Sql {
            name: file.name.clone(),
            source,
        })?;
        tx.execute_batch(&file.sql).map_err(|source| MigrationError::Sql {
            name: file.name.clone(),
            source,
        })?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            rusqlite::params![file.version, file.name],
        )
        .map_err(|source| MigrationError::Sql {
            name: file.name.clone(),
            source,
        })?;
        tx.commit().map_err(|source| MigrationError::Sql {
            name: file.name.clone(),
            source,
        })?;
    }
    Ok(())
}

/// The migrations baked into this binary via `include_str!`, in order.
/// A deployment that needs to add a migration adds both the `.sql` file
/// under `migrations/` and an entry here.
pub fn bundled() -> Vec<MigrationFile> {
    vec![
        MigrationFile {
            version: 1,
            name: "run_locks".to_string(),
            sql: include_str!("../migrations/001_run_locks.sql").to_string(),
        },
        MigrationFile {
            version: 2,
            name: "state_locks".to_string(),
            sql: include_str!("../migrations/002_state_locks.sql").to_string(),
        },
        MigrationFile {
            version: 3,
            name: "execution_locks".to_string(),
            sql: include_str!("../migrations/003_execution_locks.sql").to_string(),
        },
    ]
}

#[cfg(test)]
#[path = "migrations_tests.rs"]
mod tests;
