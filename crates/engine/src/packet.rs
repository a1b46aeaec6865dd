// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External collaborator interfaces (`spec.md` §6 "External interfaces").
//!
//! Platform-specific socket construction, BPF filter attachment, and
//! interface enumeration are out of scope (`spec.md` §1); this module only
//! declares the two traits the runtime drives against, plus the packet
//! object contract shared between them.

use std::fmt;
use std::time::Instant;

use async_trait::async_trait;

/// Opaque packet object. Dissection is out of scope (`spec.md` §1) — the
/// core only ever needs a debug summary and a structural copy for the
/// session log (`spec.md` §6 "Packet object").
pub trait Packet: Send + Sync + fmt::Debug {
    /// One-line description for logs.
    fn summary(&self) -> String;

    /// Arrival timestamp, set by the dispatch loop right after `recv`
    /// returns (`spec.md` §6: "the `time` attribute, if writable, is set to
    /// the arrival timestamp").
    fn set_arrival_time(&mut self, _time: Instant) {}

    /// Structural copy retained in the session log, independent of the
    /// packet handed to condition bodies (`spec.md` §9 "copy then log").
    fn box_clone(&self) -> Box<dyn Packet>;
}

impl Clone for Box<dyn Packet> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Provided by the platform layer: yields packets, or `None` when a read
/// produced nothing addressed to us (`spec.md` §6 "Listening socket").
#[async_trait]
pub trait ListeningSocket: Send {
    async fn recv(&mut self, max_bytes: usize) -> std::io::Result<Option<Box<dyn Packet>>>;
}

/// Provided by the platform layer: emits one packet (`spec.md` §6
/// "Sending socket").
#[async_trait]
pub trait SendingSocket: Send {
    async fn send(&mut self, packet: &dyn Packet) -> std::io::Result<()>;
}

#[cfg(test)]
#[path = "packet_tests.rs"]
mod tests;
