// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Positional/keyword argument carrier passed between state bodies,
//! conditions, and actions (`spec.md` §3 "Transition request", §4.3 step 4).
//!
//! The original automaton passes Python `*args, **kwargs` around untyped.
//! `ArgPack` is the typed equivalent: an ordered list of positional JSON
//! values plus a map of named ones, cheap to clone and to serialize for
//! logging.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Arguments threaded through one state entry: the state body's return
/// value, the payload of a transition request, or the payload handed to a
/// fired action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgPack {
    pub positional: Vec<Value>,
    pub keyword: HashMap<String, Value>,
}

impl ArgPack {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build an `ArgPack` from a single positional value — the common case
    /// of a state function returning one value (`spec.md` §4.3 step 4).
    pub fn one(value: impl Into<Value>) -> Self {
        Self { positional: vec![value.into()], keyword: HashMap::new() }
    }

    /// Build an `ArgPack` from an ordered list of positional values — the
    /// case of a state function returning a tuple.
    pub fn many(values: impl IntoIterator<Item = Value>) -> Self {
        Self { positional: values.into_iter().collect(), keyword: HashMap::new() }
    }

    pub fn with_keyword(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    pub fn kw(&self, key: &str) -> Option<&Value> {
        self.keyword.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

impl From<Value> for ArgPack {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::many(items),
            Value::Null => Self::empty(),
            other => Self::one(other),
        }
    }
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
