// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn current_process_is_alive() {
    assert!(is_process_alive(std::process::id()));
}

#[test]
fn pid_one_is_alive_on_any_running_system() {
    assert!(is_process_alive(1));
}

#[cfg(unix)]
#[test]
fn a_vacated_high_pid_is_not_alive() {
    // PID 4_194_303 exceeds Linux's default pid_max; extremely unlikely to
    // be assigned to a live process in any test environment.
    assert!(!is_process_alive(4_194_303));
}
