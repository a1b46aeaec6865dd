// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dispatch loop (`spec.md` §4.4): multiplexes the listening socket,
//! named I/O pipes, and the current state's timeout cursor, directly
//! modeled on the teacher's `session/run.rs` `tokio::select!` loop that
//! multiplexes backend output, consumer input, and several independent
//! timers in one place.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, trace};

use crate::builder::MasterFilter;
use crate::clock::Clock;
use crate::condition::{ConditionDescriptor, ConditionEvent, ConditionKind, ConditionOutcome};
use crate::condition::{TransitionRequest, TransitionTrigger};
use crate::error::Halt;
use crate::packet::ListeningSocket;
use crate::pipe::IoEndpoint;
use crate::registry::TimeoutEntry;
use crate::state::StateOutput;

type DispatchFuture<'a> = Pin<Box<dyn Future<Output = DispatchEvent> + Send + 'a>>;

enum DispatchEvent {
    Packet(Option<Box<dyn crate::packet::Packet>>),
    Pipe(String, Option<Value>),
    SocketError(std::io::Error),
}

/// Runs §4.4 for one state entry: fires due timeouts, then waits on
/// whichever of {listening socket, named pipes} is relevant, until some
/// condition commits a transition.
///
/// Disjoint borrows of `listening` and `pipes` (rather than `&mut
/// AutomatonCore`) let the packet-receive future and the per-pipe receive
/// futures live in the same `select_all` set without fighting the borrow
/// checker over a shared owner.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn dispatch_loop(
    clock: &dyn Clock,
    entry_time: Instant,
    timeouts: &[TimeoutEntry],
    recv_conditions: &[ConditionDescriptor],
    ioevents: &[ConditionDescriptor],
    master_filter: &MasterFilter,
    listening: &mut Option<Box<dyn ListeningSocket>>,
    pipes: &HashMap<String, IoEndpoint<Value>>,
    mtu: usize,
    output: &StateOutput,
) -> Result<(ConditionDescriptor, TransitionRequest), Halt> {
    let mut cursor = 0usize;

    loop {
        let elapsed = clock.now().saturating_duration_since(entry_time);

        while let Some(TimeoutEntry::Fire { deadline, condition }) = timeouts.get(cursor) {
            if *deadline > elapsed {
                break;
            }
            cursor += 1;
            trace!(condition = %condition.name, deadline_ms = deadline.as_millis(), "timeout fired");
            if let ConditionOutcome::Transition(mut request) =
                (condition.body)(output, ConditionEvent::None)
            {
                request.trigger = TransitionTrigger::Timeout { deadline: *deadline };
                debug!(condition = %condition.name, target = %request.target, "timeout committed transition");
                return Ok((condition.clone(), request));
            }
        }

        let remaining = timeouts.get(cursor).and_then(TimeoutEntry::deadline).map(|deadline| {
            deadline.checked_sub(elapsed).unwrap_or(Duration::ZERO)
        });

        let mut futures: Vec<DispatchFuture<'_>> = Vec::new();

        if !recv_conditions.is_empty() {
            if let Some(socket) = listening.as_mut() {
                futures.push(Box::pin(async move {
                    match socket.recv(mtu).await {
                        Ok(packet) => DispatchEvent::Packet(packet),
                        Err(e) => DispatchEvent::SocketError(e),
                    }
                }));
            }
        }

        let pipe_names: HashSet<&str> = ioevents
            .iter()
            .filter_map(|c| match &c.kind {
                ConditionKind::IoEvent { pipe_name } => Some(pipe_name.as_str()),
                _ => None,
            })
            .collect();
        for name in pipe_names {
            if let Some(pipe) = pipes.get(name) {
                let owned_name = name.to_owned();
                futures.push(Box::pin(async move {
                    let value = pipe.recv().await;
                    DispatchEvent::Pipe(owned_name, value)
                }));
            }
        }

        let event = if let Some(remaining) = remaining {
            let sleep = tokio::time::sleep(remaining);
            if futures.is_empty() {
                sleep.await;
                continue;
            }
            tokio::select! {
                _ = sleep => continue,
                (event, _idx, _rest) = futures_util::future::select_all(futures) => event,
            }
        } else {
            if futures.is_empty() {
                // No live timer and nothing to wait on: the declared state
                // has a non-sentinel timeout list that's been exhausted
                // without ever transitioning, and no receive/IO conditions.
                // Registry construction can't rule this out statically; it
                // surfaces as an indefinite wait, same as the original.
                std::future::pending::<()>().await;
            }
            let (event, _idx, _rest) = futures_util::future::select_all(futures).await;
            event
        };

        match event {
            DispatchEvent::SocketError(e) => {
                debug!(error = %e, "listening socket error");
                return Err(Halt::Io(e));
            }
            DispatchEvent::Packet(None) => {}
            DispatchEvent::Packet(Some(mut packet)) => {
                packet.set_arrival_time(clock.now());
                if master_filter(packet.as_ref()) {
                    trace!(packet = %packet.summary(), "packet accepted by master filter");
                    for condition in recv_conditions {
                        if let ConditionOutcome::Transition(mut request) =
                            (condition.body)(output, ConditionEvent::Packet(packet.as_ref()))
                        {
                            request.trigger = TransitionTrigger::Receive { packet: packet.box_clone() };
                            debug!(condition = %condition.name, target = %request.target, "receive committed transition");
                            return Ok((condition.clone(), request));
                        }
                    }
                } else {
                    trace!(packet = %packet.summary(), "packet filtered out by master filter");
                }
            }
            DispatchEvent::Pipe(_, None) => {}
            DispatchEvent::Pipe(name, Some(value)) => {
                trace!(pipe = %name, "pipe delivery");
                for condition in ioevents {
                    let bound = matches!(&condition.kind, ConditionKind::IoEvent { pipe_name } if *pipe_name == name);
                    if !bound {
                        continue;
                    }
                    if let ConditionOutcome::Transition(mut request) =
                        (condition.body)(output, ConditionEvent::PipeObject(&value))
                    {
                        request.trigger = TransitionTrigger::IoEvent { pipe_name: name.clone() };
                        debug!(condition = %condition.name, target = %request.target, "io event committed transition");
                        return Ok((condition.clone(), request));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
