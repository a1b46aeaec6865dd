// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use crate::args::ArgPack;
use crate::state::StateName;

/// Failure building a [`crate::registry::Registry`] from declared states,
/// conditions, and actions.
///
/// Fatal at automaton-construction time: an automaton whose declarations
/// fail these checks never runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidDeclaration {
    /// A condition referenced a state name that was never declared.
    UnknownState { condition: String, state: StateName },
    /// An action referenced a condition name that was never declared.
    UnknownCondition { action: String, condition: String },
    /// Two states were declared with the same name.
    DuplicateState(StateName),
    /// No state was marked `initial`.
    NoInitialState,
}

impl fmt::Display for InvalidDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownState { condition, state } => {
                write!(f, "condition {condition:?} targets unknown state {state:?}")
            }
            Self::UnknownCondition { action, condition } => {
                write!(f, "action {action:?} targets unknown condition {condition:?}")
            }
            Self::DuplicateState(name) => write!(f, "duplicate state {name:?}"),
            Self::NoInitialState => write!(f, "no state marked initial"),
        }
    }
}

impl std::error::Error for InvalidDeclaration {}

/// Reasons a `step()` stopped driving the automaton.
///
/// `Breakpoint`, `Stuck`, and `ErrorState` are not programming errors in the
/// usual sense — they're control-flow outcomes a caller is expected to
/// match on — but they implement `std::error::Error` so they compose with
/// `anyhow`/`?` the way the rest of the runtime does.
#[derive(Debug, Clone)]
pub enum Halt {
    /// The current state's name is in the breakpoint set and wasn't the
    /// state we last paused at.
    Breakpoint(StateName),
    /// The current state has no receive/I/O conditions and only the
    /// sentinel timeout: there is no way to make progress.
    Stuck(ArgPack),
    /// The current state is marked `error`.
    ErrorState(ArgPack),
    /// The current state is marked `final`; the automaton finished normally.
    Terminated(ArgPack),
    /// An action fired by a committed transition returned an error. The
    /// automaton is left in the pre-transition state.
    ActionFailed { condition: String, source: anyhow::Error },
    /// A listening or sending socket operation failed.
    Io(std::io::Error),
    /// `run`/`run_background` was cancelled mid-wait. The automaton is left
    /// re-runnable at its current state.
    Interrupted,
    /// A committed transition named a state no target was ever registered
    /// for. Unlike the registry-time checks in [`InvalidDeclaration`], a
    /// transition request's target is a runtime value — a condition body
    /// can name any state, typo included — so this can only be caught when
    /// the automaton tries to enter it.
    UnknownState(StateName),
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Breakpoint(state) => write!(f, "breakpoint at {state:?}"),
            Self::Stuck(_) => write!(f, "stuck: no way to leave the current state"),
            Self::ErrorState(_) => write!(f, "reached an error state"),
            Self::Terminated(_) => write!(f, "reached a final state"),
            Self::ActionFailed { condition, source } => {
                write!(f, "action for condition {condition:?} failed: {source}")
            }
            Self::Io(e) => write!(f, "socket I/O error: {e}"),
            Self::Interrupted => write!(f, "run interrupted"),
            Self::UnknownState(state) => write!(f, "transition target {state:?} is not a registered state"),
        }
    }
}

impl std::error::Error for Halt {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ActionFailed { source, .. } => Some(source.as_ref()),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Halt {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
