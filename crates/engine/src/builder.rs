// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Explicit registration API, replacing the original's decorator-tagged
//! member-walk (`spec.md` §9 "Tag-based declaration"): states, conditions,
//! and actions are collected into one ordered list each as they're
//! declared, then handed to [`crate::registry::build_registry`].

use std::sync::Arc;

use crate::action::ActionDescriptor;
use crate::condition::ConditionDescriptor;
use crate::error::InvalidDeclaration;
use crate::packet::Packet;
use crate::registry::Registry;
use crate::state::StateDescriptor;

/// Predicate deciding whether a received packet is considered for receive
/// conditions at all (`spec.md` Glossary "Master filter").
pub type MasterFilter = Arc<dyn Fn(&dyn Packet) -> bool + Send + Sync>;

/// A built automaton type: the read-only dispatch tables plus the master
/// filter (`spec.md` §3 "Lifecycle": "Registry tables are built once at
/// automaton-type construction and are treated as read-only thereafter").
pub struct AutomatonDefinition {
    pub registry: Registry,
    pub master_filter: MasterFilter,
}

/// Accumulates states, conditions, and actions, then validates and freezes
/// them into an [`AutomatonDefinition`].
#[derive(Default)]
pub struct AutomatonBuilder {
    states: Vec<StateDescriptor>,
    conditions: Vec<ConditionDescriptor>,
    actions: Vec<ActionDescriptor>,
    master_filter: Option<MasterFilter>,
}

impl AutomatonBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(mut self, state: StateDescriptor) -> Self {
        self.states.push(state);
        self
    }

    pub fn condition(mut self, condition: ConditionDescriptor) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn action(mut self, action: ActionDescriptor) -> Self {
        self.actions.push(action);
        self
    }

    /// Override the default master filter, which accepts every packet
    /// (`SPEC_FULL.md` §3 "master_filter default").
    pub fn master_filter(
        mut self,
        filter: impl Fn(&dyn Packet) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.master_filter = Some(Arc::new(filter));
        self
    }

    pub fn build(self) -> Result<AutomatonDefinition, InvalidDeclaration> {
        let registry = crate::registry::build_registry(self.states, self.conditions, self.actions)?;
        let master_filter = self.master_filter.unwrap_or_else(|| Arc::new(|_: &dyn Packet| true));
        Ok(AutomatonDefinition { registry, master_filter })
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
