// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Automaton core: runtime state plus the state-entry protocol
//! (`spec.md` §4.3).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::args::ArgPack;
use crate::builder::AutomatonDefinition;
use crate::clock::Clock;
use crate::condition::{ConditionEvent, ConditionOutcome, TransitionRequest, TransitionTrigger};
use crate::config::AutomatonConfig;
use crate::dispatch;
use crate::error::Halt;
use crate::packet::{ListeningSocket, Packet, SendingSocket};
use crate::pipe::IoEndpoint;
use crate::state::StateName;

/// Runtime state created on `start`, mutated only by the driving task,
/// destroyed on termination (`spec.md` §3 "Lifecycle").
pub struct AutomatonCore {
    definition: Arc<AutomatonDefinition>,
    config: AutomatonConfig,
    clock: Arc<dyn Clock>,
    current: StateName,
    current_args: ArgPack,
    breakpoints: HashSet<StateName>,
    last_breakpointed: Option<StateName>,
    session_log: Vec<Box<dyn Packet>>,
    listening: Option<Box<dyn ListeningSocket>>,
    sending: Option<Box<dyn SendingSocket>>,
    pipes: HashMap<String, IoEndpoint<Value>>,
}

impl AutomatonCore {
    /// `start(args…)` (`spec.md` §4.3): opens runtime state at the first
    /// initial state (`spec.md` §3: "if several are, the first in
    /// registration order is chosen").
    pub fn start(
        definition: Arc<AutomatonDefinition>,
        config: AutomatonConfig,
        clock: Arc<dyn Clock>,
        listening: Option<Box<dyn ListeningSocket>>,
        sending: Option<Box<dyn SendingSocket>>,
        pipes: HashMap<String, IoEndpoint<Value>>,
        args: ArgPack,
    ) -> Self {
        let current = definition.registry.initial_states[0].clone();
        debug!(state = %current, "automaton starting");
        Self {
            definition,
            config,
            clock,
            current,
            current_args: args,
            breakpoints: HashSet::new(),
            last_breakpointed: None,
            session_log: Vec::new(),
            listening,
            sending,
            pipes,
        }
    }

    pub fn current_state(&self) -> &StateName {
        &self.current
    }

    pub fn session_log(&self) -> &[Box<dyn Packet>] {
        &self.session_log
    }

    pub fn add_breakpoint(&mut self, state: impl Into<StateName>) {
        self.breakpoints.insert(state.into());
    }

    pub fn remove_breakpoint(&mut self, state: &StateName) {
        self.breakpoints.remove(state);
    }

    pub fn pipe(&self, name: &str) -> Option<&IoEndpoint<Value>> {
        self.pipes.get(name)
    }

    /// `send(packet)` (`spec.md` §4.3): emits via the send-socket and
    /// appends a copy — not a reference — to the session log
    /// (`spec.md` §4.5, §9 "Copy then log").
    pub async fn send(&mut self, packet: &dyn Packet) -> Result<(), Halt> {
        let socket = self.sending.as_mut().ok_or_else(|| {
            Halt::Io(std::io::Error::new(std::io::ErrorKind::NotConnected, "no sending socket configured"))
        })?;
        socket.send(packet).await?;
        self.session_log.push(packet.box_clone());
        Ok(())
    }

    /// Advances by one state entry or one dispatched event
    /// (`spec.md` §4.3 "State-entry protocol"). Returns the transition
    /// request that was committed.
    pub async fn step(&mut self) -> Result<TransitionRequest, Halt> {
        // 1. Breakpoint check.
        if self.breakpoints.contains(&self.current)
            && self.last_breakpointed.as_ref() != Some(&self.current)
        {
            self.last_breakpointed = Some(self.current.clone());
            return Err(Halt::Breakpoint(self.current.clone()));
        }
        self.last_breakpointed = None;

        // 2. Run state body.
        //
        // Cloned out of `self` (cheap: an `Arc` bump) rather than borrowed,
        // so the immutable borrow doesn't outlive the calls to `self.commit`
        // below — the registry is read-only for the whole lifetime of the
        // automaton type, so an independent handle is just as good as a
        // borrow (`spec.md` §3 "Lifecycle").
        let definition = Arc::clone(&self.definition);
        let registry = &definition.registry;
        let state = registry
            .states
            .get(&self.current)
            .ok_or_else(|| Halt::UnknownState(self.current.clone()))?;
        trace!(state = %self.current, "entering state");
        let output = (state.body)(&self.current_args);

        // 3. Terminal checks.
        if state.is_error {
            return Err(Halt::ErrorState(output));
        }
        if state.is_final {
            return Err(Halt::Terminated(output));
        }

        // 4. Output normalization happens at the boundary of `StateBody`
        // itself: bodies return an `ArgPack` directly (`spec.md` §4.3 step
        // 4), so there's no separate "wrap scalar vs. pass tuple through"
        // branch to execute here.

        // 5. Immediate conditions.
        let empty = Vec::new();
        let immediates = registry.conditions.get(&self.current).unwrap_or(&empty);
        for condition in immediates {
            if let ConditionOutcome::Transition(mut request) =
                (condition.body)(&output, ConditionEvent::None)
            {
                request.trigger = TransitionTrigger::Immediate;
                self.commit(&condition.name, request.clone())?;
                return Ok(request);
            }
        }

        // 6. Stuck detection.
        if registry.is_dead_end(&self.current) {
            return Err(Halt::Stuck(output));
        }

        // 7. Dispatch loop.
        let recv_conditions = registry.recv_conditions.get(&self.current).unwrap_or(&empty);
        let ioevents = registry.ioevents.get(&self.current).unwrap_or(&empty);
        let no_timeouts = Vec::new();
        let timeouts = registry.timeouts.get(&self.current).unwrap_or(&no_timeouts);

        let (condition, request) = dispatch::dispatch_loop(
            self.clock.as_ref(),
            self.clock.now(),
            timeouts,
            recv_conditions,
            ioevents,
            &definition.master_filter,
            &mut self.listening,
            &self.pipes,
            self.config.mtu,
            &output,
        )
        .await?;

        self.commit(&condition.name, request.clone())?;
        Ok(request)
    }

    /// Commit of a transition request (`spec.md` §4.3 "Commit of a
    /// transition request").
    fn commit(&mut self, condition_name: &str, request: TransitionRequest) -> Result<(), Halt> {
        if let TransitionTrigger::Receive { packet } = &request.trigger {
            self.session_log.push(packet.box_clone());
        }

        if let Some(actions) = self.definition.registry.actions.get(condition_name) {
            for action in actions {
                trace!(condition = condition_name, action = %action.name, "running action");
                if let Err(source) = (action.body)(&request.action_args) {
                    debug!(condition = condition_name, action = %action.name, error = %source, "action failed");
                    return Err(Halt::ActionFailed { condition: condition_name.to_owned(), source });
                }
            }
        }

        debug!(from = %self.current, to = %request.target, condition = condition_name, "transition committed");
        self.current = request.target;
        self.current_args = request.enter_args;
        Ok(())
    }
}

#[cfg(test)]
#[path = "automaton_tests.rs"]
mod tests;
