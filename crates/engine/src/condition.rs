// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Condition descriptors and transition requests (`spec.md` §3 "Condition
//! descriptor", "Transition request"; §9 "Transition-as-exception").
//!
//! The original unwinds a condition body by raising an exception that
//! carries the target state. Here a condition body returns
//! [`ConditionOutcome`] instead: the dispatch loop inspects the value
//! rather than catching a control-flow exception.

use std::sync::Arc;
use std::time::Duration;

use crate::args::ArgPack;
use crate::packet::Packet;
use crate::state::StateName;

/// What kind of wakeup a condition is bound to (`spec.md` §3 "Condition
/// descriptor").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionKind {
    /// Evaluated synchronously right after state entry, before any wait.
    Immediate,
    /// Evaluated for each packet the master filter accepts.
    Receive,
    /// Bound to a named pipe; evaluated when that pipe has a pending object.
    IoEvent { pipe_name: String },
    /// Fires once, `deadline` after state entry.
    Timeout { deadline: Duration },
}

/// The data a condition body sees, beyond the state's own output
/// (`spec.md` §4.4 step 3: `(pkt, *state_output)` / `(pipe_endpoint,
/// *state_output)`).
pub enum ConditionEvent<'a> {
    None,
    Packet(&'a dyn Packet),
    PipeObject(&'a serde_json::Value),
}

/// Result of evaluating a condition body: either nothing happened, or the
/// body wants to leave the current state (`spec.md` §9).
pub enum ConditionOutcome {
    NoTransition,
    Transition(TransitionRequest),
}

/// Why a transition was requested — carries the extra context the commit
/// step appends to the session log (`spec.md` §4.3 "Commit of a transition
/// request").
#[derive(Debug, Clone)]
pub enum TransitionTrigger {
    Immediate,
    Receive { packet: Box<dyn Packet> },
    IoEvent { pipe_name: String },
    Timeout { deadline: Duration },
}

/// Emitted by invoking a state function from within a condition body
/// (`spec.md` §3 "Transition request"). The sole legal means of changing
/// state.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub target: StateName,
    /// Arguments passed to the new state's body.
    pub enter_args: ArgPack,
    /// Separate payload passed to each action fired by this transition.
    pub action_args: ArgPack,
    pub trigger: TransitionTrigger,
}

impl TransitionRequest {
    /// `trigger` starts as [`TransitionTrigger::Immediate`] regardless of
    /// which condition kind raised this request — the dispatch loop
    /// overwrites it with the actual triggering packet/pipe/deadline before
    /// the request reaches [`crate::automaton::AutomatonCore`]'s commit
    /// step, so callers never need to set it themselves.
    pub fn new(target: impl Into<StateName>) -> Self {
        Self {
            target: target.into(),
            enter_args: ArgPack::empty(),
            action_args: ArgPack::empty(),
            trigger: TransitionTrigger::Immediate,
        }
    }

    pub fn with_enter_args(mut self, args: ArgPack) -> Self {
        self.enter_args = args;
        self
    }

    pub fn with_action_args(mut self, args: ArgPack) -> Self {
        self.action_args = args;
        self
    }
}

/// The callable bound to a condition. Takes the current state's output plus
/// whatever triggered this evaluation (nothing, a packet, or a pipe
/// object) and decides whether to transition.
pub type ConditionBody =
    Arc<dyn Fn(&ArgPack, ConditionEvent<'_>) -> ConditionOutcome + Send + Sync>;

/// A declared condition, bound to exactly one state (`spec.md` §3).
#[derive(Clone)]
pub struct ConditionDescriptor {
    pub kind: ConditionKind,
    pub state: StateName,
    /// Lower runs first.
    pub priority: i32,
    /// Used to associate actions (`spec.md` §3 "Action descriptor").
    pub name: String,
    pub body: ConditionBody,
}

impl std::fmt::Debug for ConditionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionDescriptor")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("priority", &self.priority)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
