// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State descriptors (`spec.md` §3 "State descriptor").

use std::fmt;
use std::sync::Arc;

use crate::args::ArgPack;

/// A state's unique name. Cheap to clone and compare; states are looked up
/// by name throughout the registry and runtime.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateName(Arc<str>);

impl StateName {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Debug as the bare quoted name, not the tuple-struct wrapper — error
/// messages interpolate `{state:?}` expecting this.
impl fmt::Debug for StateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0.as_ref())
    }
}

impl<T: Into<Arc<str>>> From<T> for StateName {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

/// Outcome of running a state's body (`spec.md` §4.3 step 4): either nothing,
/// or an output tuple forwarded as positional arguments to every condition
/// evaluated while in this state.
pub type StateOutput = ArgPack;

/// The callable executed on state entry. Receives the arguments stored on
/// the transition request that entered this state and returns the state's
/// output (`spec.md` §3 "State body", §4.3 step 2).
pub type StateBody = Arc<dyn Fn(&ArgPack) -> StateOutput + Send + Sync>;

/// A declared state: immutable once the registry is built
/// (`spec.md` §3 "Lifecycle").
#[derive(Clone)]
pub struct StateDescriptor {
    pub name: StateName,
    pub initial: bool,
    pub is_final: bool,
    pub is_error: bool,
    pub body: StateBody,
}

impl StateDescriptor {
    pub fn new(name: impl Into<StateName>, body: StateBody) -> Self {
        Self { name: name.into(), initial: false, is_final: false, is_error: false, body }
    }

    pub fn initial(mut self) -> Self {
        self.initial = true;
        self
    }

    pub fn terminal(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn error(mut self) -> Self {
        self.is_error = true;
        self
    }
}

impl fmt::Debug for StateDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDescriptor")
            .field("name", &self.name)
            .field("initial", &self.initial)
            .field("is_final", &self.is_final)
            .field("is_error", &self.is_error)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
