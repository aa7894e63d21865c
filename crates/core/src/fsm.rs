// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task finite-state machine: pure data, no I/O, no locks.
//!
//! Two tables drive every transition in the system: [`valid_transition`]
//! answers "is this edge legal at all" and [`next`] answers "what edge
//! does this event produce". Workers and the Manager both consult the
//! same tables so a task's legal history never depends on which side is
//! asking.

use serde::{Deserialize, Serialize};

/// A task's place in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Pending,
    Scheduled,
    Running,
    Completed,
    Failed,
    /// Sentinel: the requested transition had no mapping in [`next`].
    Dropped,
}

crate::simple_display! {
    TaskState {
        Pending => "pending",
        Scheduled => "scheduled",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Dropped => "dropped",
    }
}

impl TaskState {
    /// Terminal states are never dispatched again.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed | TaskState::Dropped)
    }
}

/// Desired-state command carried by a [`crate::task::TaskEvent`].
///
/// Named `SpinUp`/`SpinDown` rather than `Start`/`Stop` to keep the event
/// vocabulary distinct from the state vocabulary — an event selects a
/// dispatch arm, a state is where a task currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskEventKind {
    SpinUp,
    SpinDown,
}

crate::simple_display! {
    TaskEventKind {
        SpinUp => "spin_up",
        SpinDown => "spin_down",
    }
}

/// Is `dst` a legal destination from `src`?
///
/// This checks the *computed* next state produced by [`next`], not a
/// caller-declared target — callers that skip [`next`] and call this
/// directly are asking "could the table ever produce this edge".
pub fn valid_transition(src: TaskState, dst: TaskState) -> bool {
    use TaskState::*;
    matches!(
        (src, dst),
        (Pending, Scheduled)
            | (Scheduled, Scheduled)
            | (Scheduled, Running)
            | (Scheduled, Failed)
            | (Running, Running)
            | (Running, Completed)
            | (Running, Failed)
    )
}

/// Compute the destination state for `event` fired from `src`.
///
/// Returns [`TaskState::Dropped`] for any `(src, event)` pair with no
/// mapping — the sentinel, never a panic.
pub fn next(src: TaskState, event: TaskEventKind) -> TaskState {
    use TaskEventKind::*;
    use TaskState::*;
    match (src, event) {
        (Pending, SpinUp) => Scheduled,
        (Scheduled, SpinUp) => Running,
        (Scheduled, SpinDown) => Completed,
        (Running, SpinDown) => Completed,
        _ => Dropped,
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_state() -> impl Strategy<Value = TaskState> {
        prop_oneof![
            Just(TaskState::Pending),
            Just(TaskState::Scheduled),
            Just(TaskState::Running),
            Just(TaskState::Completed),
            Just(TaskState::Failed),
            Just(TaskState::Dropped),
        ]
    }

    fn any_event() -> impl Strategy<Value = TaskEventKind> {
        prop_oneof![Just(TaskEventKind::SpinUp), Just(TaskEventKind::SpinDown)]
    }

    proptest! {
        #[test]
        fn next_never_produces_an_edge_the_validator_rejects(src in any_state(), ev in any_event()) {
            let dst = next(src, ev);
            prop_assert!(dst == TaskState::Dropped || valid_transition(src, dst));
        }
    }
}
