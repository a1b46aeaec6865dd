// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner facade (`spec.md` §4.5): foreground `run`, background `run`,
//! `send`, and the single-step iterator.
//!
//! Background execution replaces the original's raw thread handle
//! (`spec.md` §9 "Background execution via a raw thread handle") with a
//! worker that owns the automaton outright and exposes a join handle plus a
//! `CancellationToken`, the same two-piece handle shape the teacher uses
//! for its backend/detector worker tasks in `session/run.rs`.

use futures_util::Stream;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::args::ArgPack;
use crate::automaton::AutomatonCore;
use crate::condition::TransitionRequest;
use crate::error::Halt;
use crate::packet::Packet;
use crate::pipe::IoEndpoint;
use crate::state::StateName;

/// Owns an [`AutomatonCore`] and drives it.
pub struct Runner {
    core: AutomatonCore,
}

/// Handle to a backgrounded automaton (`spec.md` §4.3 `run_background`).
pub struct AutomatonHandle {
    pub join: JoinHandle<Result<ArgPack, Halt>>,
    pub shutdown: CancellationToken,
}

impl AutomatonHandle {
    /// Cancel the background run and wait for it to unwind.
    ///
    /// Cancellation is distinct from reaching a `final` state
    /// (`SPEC_FULL.md` §3): it surfaces as `Halt::Interrupted`, not
    /// `Halt::Terminated`.
    pub async fn shutdown(self) -> Result<Result<ArgPack, Halt>, tokio::task::JoinError> {
        self.shutdown.cancel();
        self.join.await
    }
}

impl Runner {
    pub fn new(core: AutomatonCore) -> Self {
        Self { core }
    }

    pub fn current_state(&self) -> &StateName {
        self.core.current_state()
    }

    pub fn add_breakpoint(&mut self, state: impl Into<StateName>) {
        self.core.add_breakpoint(state);
    }

    pub fn remove_breakpoint(&mut self, state: &StateName) {
        self.core.remove_breakpoint(state);
    }

    pub fn pipe(&self, name: &str) -> Option<&IoEndpoint<Value>> {
        self.core.pipe(name)
    }

    /// Forwards to the send-socket and appends a copy to the session log
    /// (`spec.md` §4.5 "send").
    pub async fn send(&mut self, packet: &dyn Packet) -> Result<(), Halt> {
        self.core.send(packet).await
    }

    /// Repeatedly steps until `Terminated` (returning its value) or `cancel`
    /// is triggered, in which case the run unwinds cleanly and the
    /// automaton is left paused, ready for another `run` call
    /// (`spec.md` §4.5 "run").
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<ArgPack, Halt> {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Halt::Interrupted),
                outcome = self.core.step() => match outcome {
                    Ok(_request) => continue,
                    Err(Halt::Terminated(value)) => return Ok(value),
                    Err(halt) => return Err(halt),
                },
            }
        }
    }

    /// Spawns a worker whose sole job is `run` (`spec.md` §4.5
    /// "run_background", §5 "Background mode does not add parallelism
    /// within the automaton"). Cross-thread interaction happens only
    /// through the automaton's I/O pipes; callers should finish mutating
    /// breakpoints before calling this (`spec.md` §9 Open Question 3).
    pub fn run_background(mut self) -> AutomatonHandle {
        let shutdown = CancellationToken::new();
        let cancel = shutdown.clone();
        let join = tokio::spawn(async move { self.run(&cancel).await });
        AutomatonHandle { join, shutdown }
    }

    /// Yields the result of each `step` (`spec.md` §4.5 "Iterator facade").
    /// The stream ends after the first `Halt`, which is yielded as its
    /// final item.
    pub fn steps(self) -> impl Stream<Item = Result<TransitionRequest, Halt>> {
        futures_util::stream::unfold(Some(self), |state| async move {
            let mut runner = state?;
            match runner.core.step().await {
                Ok(request) => Some((Ok(request), Some(runner))),
                Err(halt) => Some((Err(halt), None)),
            }
        })
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
