// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    padded_ok           = { "  ok  ",        Decision::Succeeded },
    empty                = { "",             Decision::Pending },
    unrecognized         = { "xyz",          Decision::NeedsChanges },
    spaced_needs_changes = { "NEEDS CHANGES", Decision::NeedsChanges },
    mixed_case_approved  = { "Approved",     Decision::Succeeded },
    screaming_reject     = { "REJECT",       Decision::NeedsChanges },
    dashed_needs_changes = { "needs-changes", Decision::NeedsChanges },
)]
fn parses(raw: &str, expected: Decision) {
    assert_eq!(parse_decision(raw), expected);
}

#[test]
fn journal_form_collapses_failed_into_needs_changes() {
    let j: JournalDecision = Decision::Failed.into();
    assert_eq!(j, JournalDecision::NeedsChanges);
    let j: JournalDecision = Decision::Succeeded.into();
    assert_eq!(j, JournalDecision::Ok);
    let j: JournalDecision = Decision::Pending.into();
    assert_eq!(j, JournalDecision::Pending);
}

#[test]
fn final_decisions_are_succeeded_and_failed_only() {
    assert!(Decision::Succeeded.is_final());
    assert!(Decision::Failed.is_final());
    assert!(!Decision::Pending.is_final());
    assert!(!Decision::NeedsChanges.is_final());
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn parse_decision_never_panics(raw in "[ -~]{0,40}") {
            let _ = parse_decision(&raw);
        }

        #[test]
        fn empty_or_whitespace_only_is_always_pending(spaces in "[ \t]{0,8}") {
            prop_assert_eq!(parse_decision(&spaces), Decision::Pending);
        }

        #[test]
        fn parsing_is_case_and_separator_insensitive(raw in "[a-zA-Z]{1,20}") {
            let upper = raw.to_ascii_uppercase();
            let lower = raw.to_ascii_lowercase();
            prop_assert_eq!(parse_decision(&upper), parse_decision(&lower));
        }
    }
}
