// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declaration registry: turns declared states, conditions, and actions
//! into the dispatch tables of `spec.md` §3, following the build algorithm
//! of §4.2.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use indexmap::IndexMap;

use crate::action::ActionDescriptor;
use crate::condition::{ConditionDescriptor, ConditionKind};
use crate::error::InvalidDeclaration;
use crate::state::{StateDescriptor, StateName};

/// One entry of a state's sorted timeout list: either a declared timeout
/// condition, or the terminating sentinel (`spec.md` §3 "Registry tables":
/// "terminated by a sentinel (∞, null)").
#[derive(Clone)]
pub enum TimeoutEntry {
    Fire { deadline: Duration, condition: ConditionDescriptor },
    Sentinel,
}

impl TimeoutEntry {
    pub fn deadline(&self) -> Option<Duration> {
        match self {
            Self::Fire { deadline, .. } => Some(*deadline),
            Self::Sentinel => None,
        }
    }
}

/// The dispatch tables computed once per automaton type (`spec.md` §3
/// "Registry tables", §4.2). Read-only once built.
pub struct Registry {
    pub states: IndexMap<StateName, StateDescriptor>,
    /// Ordered list of states marked `initial`; the first is entered on
    /// `start` (`spec.md` §3: "if several are, the first in registration
    /// order is chosen").
    pub initial_states: Vec<StateName>,
    pub conditions: HashMap<StateName, Vec<ConditionDescriptor>>,
    pub recv_conditions: HashMap<StateName, Vec<ConditionDescriptor>>,
    pub ioevents: HashMap<StateName, Vec<ConditionDescriptor>>,
    pub timeouts: HashMap<StateName, Vec<TimeoutEntry>>,
    pub actions: HashMap<String, Vec<ActionDescriptor>>,
    pub ionames: HashSet<String>,
}

impl Registry {
    /// A state with no receive/I/O conditions and only the sentinel timeout
    /// is a dead end (`spec.md` §3 invariant 4).
    pub fn is_dead_end(&self, state: &StateName) -> bool {
        let no_recv = self.recv_conditions.get(state).is_none_or(|v| v.is_empty());
        let no_io = self.ioevents.get(state).is_none_or(|v| v.is_empty());
        let only_sentinel = self.timeouts.get(state).is_none_or(|v| v.len() <= 1);
        no_recv && no_io && only_sentinel
    }
}

/// Builds a [`Registry`] from declared states, conditions, and actions,
/// validating the invariants of `spec.md` §3 along the way.
///
/// Replaces the original's reflective "walk all class members looking for
/// tagged callables" pass (`spec.md` §9 "Tag-based declaration") — states,
/// conditions, and actions arrive pre-collected from
/// [`crate::builder::AutomatonBuilder`], in declaration order, so step 1 of
/// `spec.md` §4.2 ("walk the class and all ancestors... later overrides
/// shadow earlier entries") has no counterpart here: there is no
/// inheritance to walk, only the one ordered list the builder assembled.
pub(crate) fn build_registry(
    states: Vec<StateDescriptor>,
    conditions: Vec<ConditionDescriptor>,
    actions: Vec<ActionDescriptor>,
) -> Result<Registry, InvalidDeclaration> {
    let mut state_map = IndexMap::new();
    let mut initial_states = Vec::new();
    for state in states {
        if state_map.contains_key(&state.name) {
            return Err(InvalidDeclaration::DuplicateState(state.name));
        }
        if state.initial {
            initial_states.push(state.name.clone());
        }
        state_map.insert(state.name.clone(), state);
    }
    if initial_states.is_empty() {
        return Err(InvalidDeclaration::NoInitialState);
    }

    let mut condition_lists: HashMap<StateName, Vec<ConditionDescriptor>> = HashMap::new();
    let mut recv_lists: HashMap<StateName, Vec<ConditionDescriptor>> = HashMap::new();
    let mut io_lists: HashMap<StateName, Vec<ConditionDescriptor>> = HashMap::new();
    let mut timeout_lists: HashMap<StateName, Vec<(Duration, ConditionDescriptor)>> =
        HashMap::new();
    let mut ionames = HashSet::new();
    let mut condition_names = HashSet::new();

    for name in state_map.keys() {
        condition_lists.insert(name.clone(), Vec::new());
        recv_lists.insert(name.clone(), Vec::new());
        io_lists.insert(name.clone(), Vec::new());
        timeout_lists.insert(name.clone(), Vec::new());
    }

    for condition in conditions {
        if !state_map.contains_key(&condition.state) {
            return Err(InvalidDeclaration::UnknownState {
                condition: condition.name,
                state: condition.state,
            });
        }
        condition_names.insert(condition.name.clone());
        match &condition.kind {
            ConditionKind::Immediate => {
                condition_lists.entry(condition.state.clone()).or_default().push(condition);
            }
            ConditionKind::Receive => {
                recv_lists.entry(condition.state.clone()).or_default().push(condition);
            }
            ConditionKind::IoEvent { pipe_name } => {
                ionames.insert(pipe_name.clone());
                io_lists.entry(condition.state.clone()).or_default().push(condition);
            }
            ConditionKind::Timeout { deadline } => {
                let deadline = *deadline;
                timeout_lists.entry(condition.state.clone()).or_default().push((deadline, condition));
            }
        }
    }

    // Sort ascending by priority; stable sort preserves registration order
    // as the tiebreak (spec.md §4.4 "Ordering guarantees").
    for list in condition_lists.values_mut() {
        list.sort_by_key(|c| c.priority);
    }
    for list in recv_lists.values_mut() {
        list.sort_by_key(|c| c.priority);
    }
    for list in io_lists.values_mut() {
        list.sort_by_key(|c| c.priority);
    }

    let mut timeouts = HashMap::new();
    for (state, mut list) in timeout_lists {
        // Sort ascending by deadline; stable sort leaves registration order
        // as the tiebreak for same-deadline timers (spec.md §9 Open
        // Question 2: "leave registration order as the tiebreak").
        list.sort_by_key(|(deadline, _)| *deadline);
        let mut entries: Vec<TimeoutEntry> = list
            .into_iter()
            .map(|(deadline, condition)| TimeoutEntry::Fire { deadline, condition })
            .collect();
        entries.push(TimeoutEntry::Sentinel);
        timeouts.insert(state, entries);
    }

    let mut action_lists: HashMap<String, Vec<(i32, ActionDescriptor)>> = HashMap::new();
    for name in &condition_names {
        action_lists.insert(name.clone(), Vec::new());
    }
    for action in actions {
        for (condition_name, priority) in &action.condition_priorities {
            if !condition_names.contains(condition_name) {
                return Err(InvalidDeclaration::UnknownCondition {
                    action: action.name.clone(),
                    condition: condition_name.clone(),
                });
            }
            action_lists
                .entry(condition_name.clone())
                .or_default()
                .push((*priority, action.clone()));
        }
    }
    let mut actions = HashMap::new();
    for (condition_name, mut list) in action_lists {
        list.sort_by_key(|(priority, _)| *priority);
        actions.insert(condition_name, list.into_iter().map(|(_, action)| action).collect());
    }

    Ok(Registry {
        states: state_map,
        initial_states,
        conditions: condition_lists,
        recv_conditions: recv_lists,
        ioevents: io_lists,
        timeouts,
        actions,
        ionames,
    })
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
