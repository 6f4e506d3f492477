// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

fn t(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).single().unwrap()
}

#[test]
fn happy_path() {
    let mut e = Execution::start("SBI-1", t(0));
    e.transition_to(Step::ImplementTry, t(1)).unwrap();
    assert_eq!(e.attempt, 1);
    e.transition_to(Step::FirstReview, t(2)).unwrap();
    assert_eq!(e.status, Status::Review);
    e.apply_decision(Decision::Succeeded, t(3)).unwrap();
    e.transition_to(Step::Done, t(4)).unwrap();
    assert!(e.is_completed());
    assert_eq!(e.final_decision(), Decision::Succeeded);
    assert_eq!(e.path().len(), 4);
}

#[test]
fn first_review_retry() {
    let mut e = Execution::start("SBI-1", t(0));
    e.transition_to(Step::ImplementTry, t(1)).unwrap();
    e.transition_to(Step::FirstReview, t(2)).unwrap();
    e.apply_decision(Decision::NeedsChanges, t(3)).unwrap();
    e.transition_to(Step::ImplementSecondTry, t(4)).unwrap();
    assert_eq!(e.attempt, 2);
    e.transition_to(Step::SecondReview, t(5)).unwrap();
    e.apply_decision(Decision::Succeeded, t(6)).unwrap();
    e.transition_to(Step::Done, t(7)).unwrap();
    assert_eq!(e.path().len(), 6);
}

#[test]
fn force_termination_after_three_needs_changes() {
    let mut e = Execution::start("SBI-1", t(0));
    e.transition_to(Step::ImplementTry, t(1)).unwrap();
    e.transition_to(Step::FirstReview, t(2)).unwrap();
    e.apply_decision(Decision::NeedsChanges, t(3)).unwrap();
    e.transition_to(Step::ImplementSecondTry, t(4)).unwrap();
    e.transition_to(Step::SecondReview, t(5)).unwrap();
    e.apply_decision(Decision::NeedsChanges, t(6)).unwrap();
    e.transition_to(Step::ImplementThirdTry, t(7)).unwrap();
    assert_eq!(e.attempt, 3);
    e.transition_to(Step::ThirdReview, t(8)).unwrap();
    e.apply_decision(Decision::NeedsChanges, t(9)).unwrap();
    assert!(e.should_force_terminate());
    assert_eq!(e.next_step(), Step::ReviewerForceImplement);
    e.transition_to(Step::ReviewerForceImplement, t(10)).unwrap();
    e.transition_to(Step::ImplementerReview, t(11)).unwrap();
    e.transition_to(Step::Done, t(12)).unwrap();
    assert_eq!(e.final_decision(), Decision::Failed);
    assert_eq!(e.path().len(), 10);
}

#[test]
fn transition_rejects_skips_and_backward_edges() {
    let mut e = Execution::start("SBI-1", t(0));
    assert!(e.transition_to(Step::FirstReview, t(1)).is_err());
    e.transition_to(Step::ImplementTry, t(1)).unwrap();
    assert!(e.transition_to(Step::Ready, t(2)).is_err());
}

#[test]
fn done_rejects_every_further_transition() {
    let mut e = Execution::start("SBI-1", t(0));
    e.transition_to(Step::ImplementTry, t(1)).unwrap();
    e.transition_to(Step::FirstReview, t(2)).unwrap();
    e.apply_decision(Decision::Succeeded, t(3)).unwrap();
    e.transition_to(Step::Done, t(4)).unwrap();
    assert!(e.transition_to(Step::Done, t(5)).is_err());
}

#[test]
fn apply_decision_requires_review_status() {
    let mut e = Execution::start("SBI-1", t(0));
    assert!(e.apply_decision(Decision::Succeeded, t(1)).is_err());
}

#[test]
fn attempt_saturates_at_max() {
    let mut e = Execution::start("SBI-1", t(0));
    e.attempt = MAX_ATTEMPT;
    let after = attempt_after(Step::ThirdReview, Step::ReviewerForceImplement, e.attempt);
    assert_eq!(after, MAX_ATTEMPT);
}

#[test]
fn completed_at_set_iff_done() {
    let mut e = Execution::start("SBI-1", t(0));
    assert!(e.completed_at.is_none());
    e.transition_to(Step::ImplementTry, t(1)).unwrap();
    assert!(e.completed_at.is_none());
    e.transition_to(Step::FirstReview, t(2)).unwrap();
    e.apply_decision(Decision::Succeeded, t(3)).unwrap();
    e.transition_to(Step::Done, t(4)).unwrap();
    assert!(e.completed_at.is_some());
}

#[test]
fn next_step_is_pure_function_of_step_and_decision() {
    assert_eq!(next_step(Step::Ready, Decision::Pending), Step::ImplementTry);
    assert_eq!(next_step(Step::Done, Decision::Succeeded), Step::Done);
    assert_eq!(
        next_step(Step::FirstReview, Decision::Succeeded),
        Step::Done
    );
    assert_eq!(
        next_step(Step::FirstReview, Decision::NeedsChanges),
        Step::ImplementSecondTry
    );
}

fn any_step() -> impl proptest::strategy::Strategy<Value = Step> {
    proptest::sample::select(Step::ALL.to_vec())
}

fn any_decision() -> impl proptest::strategy::Strategy<Value = Decision> {
    proptest::prelude::prop_oneof![
        Just(Decision::Pending),
        Just(Decision::NeedsChanges),
        Just(Decision::Succeeded),
        Just(Decision::Failed),
    ]
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn next_step_is_always_a_valid_step(step in any_step(), decision in any_decision()) {
            let to = next_step(step, decision);
            prop_assert!(Step::ALL.contains(&to));
        }

        #[test]
        fn next_step_never_regresses_order(step in any_step(), decision in any_decision()) {
            let to = next_step(step, decision);
            prop_assert!(to.order() >= step.order());
        }

        #[test]
        fn done_is_absorbing(decision in any_decision()) {
            prop_assert_eq!(next_step(Step::Done, decision), Step::Done);
        }

        #[test]
        fn transition_to_next_step_always_succeeds(step in any_step(), decision in any_decision()) {
            let mut e = Execution::start("SBI-prop", t(0));
            e.step = step;
            e.status = step.status();
            let to = e.next_step();
            prop_assert!(e.transition_to(to, t(1)).is_ok() || e.is_completed());
        }
    }
}
