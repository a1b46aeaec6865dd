// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action descriptors (`spec.md` §3 "Action descriptor").

use std::collections::HashMap;
use std::sync::Arc;

use crate::args::ArgPack;

/// The callable fired when a condition it is attached to commits a
/// transition. Receives the transition request's `action_args`
/// (`spec.md` §4.3 "Commit of a transition request").
pub type ActionBody = Arc<dyn Fn(&ArgPack) -> anyhow::Result<()> + Send + Sync>;

/// A side-effecting callable tagged with the conditions it runs for and
/// their relative priority (`spec.md` §3 "Action descriptor"). May be
/// attached to multiple conditions.
#[derive(Clone)]
pub struct ActionDescriptor {
    pub name: String,
    /// `condition_name -> priority` for every condition this action is
    /// attached to; lower runs first within that condition's action list.
    pub condition_priorities: HashMap<String, i32>,
    pub body: ActionBody,
}

impl std::fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("name", &self.name)
            .field("condition_priorities", &self.condition_priorities)
            .finish_non_exhaustive()
    }
}

impl ActionDescriptor {
    pub fn new(name: impl Into<String>, body: ActionBody) -> Self {
        Self { name: name.into(), condition_priorities: HashMap::new(), body }
    }

    pub fn for_condition(mut self, condition_name: impl Into<String>, priority: i32) -> Self {
        self.condition_priorities.insert(condition_name.into(), priority);
        self
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
