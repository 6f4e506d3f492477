use super::*;
use chrono::{DateTime, TimeZone, Utc};
use deespec_core::execution::Execution;
use deespec_core::step::Step;

fn t(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).single().unwrap()
}

fn repo() -> (FileExecutionRepository, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let repo = FileExecutionRepository::new(tmp.path().join("executions")).unwrap();
    (repo, tmp)
}

#[test]
fn save_then_find_by_id_round_trips() {
    let (repo, _tmp) = repo();
    let exec = Execution::start("item-1", t(0));
    repo.save(&exec).unwrap();
    let found = repo.find_by_id(&exec.id).unwrap().unwrap();
    assert_eq!(found.id, exec.id);
    assert_eq!(found.step, Step::Ready);
}

#[test]
fn save_twice_is_already_exists() {
    let (repo, _tmp) = repo();
    let exec = Execution::start("item-1", t(0));
    repo.save(&exec).unwrap();
    let err = repo.save(&exec).unwrap_err();
    assert!(matches!(err, DeespecError::AlreadyExists(_)));
}

#[test]
fn update_missing_is_not_found() {
    let (repo, _tmp) = repo();
    let exec = Execution::start("item-1", t(0));
    let err = repo.update(&exec).unwrap_err();
    assert!(matches!(err, DeespecError::NotFound(_)));
}

#[test]
fn survives_a_fresh_repository_handle_pointed_at_the_same_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("executions");
    let exec = Execution::start("item-1", t(0));
    {
        let repo = FileExecutionRepository::new(&dir).unwrap();
        repo.save(&exec).unwrap();
    }
    let reopened = FileExecutionRepository::new(&dir).unwrap();
    let found = reopened.find_by_id(&exec.id).unwrap().unwrap();
    assert_eq!(found.item_id, "item-1");
}

#[test]
fn find_by_sbi_id_returns_most_recent() {
    let (repo, _tmp) = repo();
    let older = Execution::start("item-1", t(0));
    let newer = Execution::start("item-1", t(10));
    repo.save(&older).unwrap();
    repo.save(&newer).unwrap();
    let found = repo.find_by_sbi_id("item-1").unwrap().unwrap();
    assert_eq!(found.id, newer.id);
}

#[test]
fn find_active_excludes_completed() {
    let (repo, _tmp) = repo();
    let mut done = Execution::start("item-done", t(0));
    done.step = Step::Done;
    let pending = Execution::start("item-pending", t(1));
    repo.save(&done).unwrap();
    repo.save(&pending).unwrap();
    let active = repo.find_active().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].item_id, "item-pending");
}

#[test]
fn delete_missing_is_not_found() {
    let (repo, _tmp) = repo();
    let exec = Execution::start("item-1", t(0));
    let err = repo.delete(&exec.id).unwrap_err();
    assert!(matches!(err, DeespecError::NotFound(_)));
}

#[test]
fn non_json_files_in_the_directory_are_ignored_by_scans() {
    let (repo, tmp) = repo();
    let exec = Execution::start("item-1", t(0));
    repo.save(&exec).unwrap();
    std::fs::write(tmp.path().join("executions").join(".DS_Store"), b"junk").unwrap();
    let active = repo.find_active().unwrap();
    assert_eq!(active.len(), 1);
}
