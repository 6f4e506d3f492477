// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn iteration_terminal_classification_matches_spec() {
    assert!(DeespecError::InvalidTransition {
        from: "ready".into(),
        to: "done".into()
    }
    .is_iteration_terminal());
    assert!(DeespecError::InvalidDecision("bad".into()).is_iteration_terminal());
    assert!(DeespecError::AlreadyCompleted("x".into()).is_iteration_terminal());
    assert!(!DeespecError::IOError {
        phase: "fsync".into(),
        message: "disk full".into()
    }
    .is_iteration_terminal());
    assert!(!DeespecError::NotFound("x".into()).is_iteration_terminal());
}

#[test]
fn messages_carry_context() {
    let err = DeespecError::MaxAttemptsReached("SBI-1".into());
    assert!(err.to_string().contains("SBI-1"));
}
