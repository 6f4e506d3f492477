// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use deespec_core::clock::FakeClock;
use deespec_core::journal::JournalEntry;
use std::fs;

#[test]
fn append_writes_a_normalized_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.ndjson");
    let writer = JournalWriter::new(&path, JournalWriterConfig::default());
    let clock = FakeClock::default();
    writer
        .append(JournalEntry::new(&clock, 1), &clock)
        .unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
    let parsed = JournalEntry::from_value(serde_json::from_str(content.lines().next().unwrap()).unwrap())
        .unwrap();
    assert_eq!(parsed.step, "unknown");
}

#[test]
fn strict_mode_rejects_invalid_decision() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.ndjson");
    let writer = JournalWriter::new(&path, JournalWriterConfig { validate: true });
    let clock = FakeClock::default();
    let mut entry = JournalEntry::new(&clock, 1);
    entry.decision = "MAYBE".to_string();
    assert!(writer.append(entry, &clock).is_err());
}

#[test]
fn lenient_mode_writes_despite_invalid_decision() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.ndjson");
    let writer = JournalWriter::new(&path, JournalWriterConfig { validate: false });
    let clock = FakeClock::default();
    let mut entry = JournalEntry::new(&clock, 1);
    entry.decision = "MAYBE".to_string();
    writer.append(entry, &clock).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
}

#[test]
fn append_map_coerces_a_bare_string_artifact_and_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.ndjson");
    let writer = JournalWriter::new(&path, JournalWriterConfig::default());
    let clock = FakeClock::default();
    let value = serde_json::json!({
        "turn": 1,
        "step": "implement_try",
        "decision": "PENDING",
        "elapsed_ms": 0,
        "error": "",
        "artifacts": "main.rs",
    });
    writer.append_map(value, &clock).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    let parsed = JournalEntry::from_value(serde_json::from_str(content.lines().next().unwrap()).unwrap())
        .unwrap();
    assert_eq!(parsed.artifacts, vec!["main.rs".to_string()]);
}

#[test]
fn successive_appends_preserve_turn_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.ndjson");
    let writer = JournalWriter::new(&path, JournalWriterConfig::default());
    let clock = FakeClock::default();
    for turn in 1..=3u64 {
        writer.append(JournalEntry::new(&clock, turn), &clock).unwrap();
    }
    let content = fs::read_to_string(&path).unwrap();
    let turns: Vec<u64> = content
        .lines()
        .map(|l| JournalEntry::from_value(serde_json::from_str(l).unwrap()).unwrap().turn)
        .collect();
    assert_eq!(turns, vec![1, 2, 3]);
}
