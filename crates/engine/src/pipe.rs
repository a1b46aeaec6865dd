// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ObjectPipe` and the paired `IoEndpoint` (`spec.md` §4.1, §6 "I/O pipe
//! endpoint").
//!
//! The original pairs an in-process queue with a raw OS pipe so a single
//! sentinel byte makes the queue's read end pollable alongside sockets. In
//! `tokio::select!` the channel itself is the awaitable — a bounded
//! `tokio::mpsc` channel already blocks the producer once full, which is
//! exactly the backpressure behavior `spec.md` §4.1 calls out ("may block
//! only if the OS pipe buffer is full... treated as backpressure, not
//! error"), so there's no separate sentinel-byte bookkeeping to keep in
//! sync (`spec.md` §4.1 invariant is satisfied structurally).

use tokio::sync::{mpsc, Mutex};

/// One direction of an I/O pipe: many sends, one receiver.
///
/// `send` is async and suspends once the bounded channel is full, matching
/// the spec's backpressure interpretation rather than failing.
pub struct ObjectPipe<T> {
    tx: mpsc::Sender<T>,
    rx: Mutex<mpsc::Receiver<T>>,
}

impl<T: Send + 'static> ObjectPipe<T> {
    pub fn new(capacity: usize) -> (mpsc::Sender<T>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx.clone(), Self { tx, rx: Mutex::new(rx) })
    }

    pub async fn recv(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }
}

/// User-facing `io.<name>` endpoint, mirrored on the automaton side as
/// `oi.<name>` (`spec.md` §6). Wraps a send half going one way and a
/// receive half coming back the other, so a single named pipe supports a
/// full duplex conversation between the caller and the dispatch loop.
pub struct IoEndpoint<T> {
    outbound: mpsc::Sender<T>,
    inbound: ObjectPipe<T>,
}

impl<T: Send + 'static> IoEndpoint<T> {
    pub async fn send(&self, obj: T) -> Result<(), mpsc::error::SendError<T>> {
        self.outbound.send(obj).await
    }

    pub async fn recv(&self) -> Option<T> {
        self.inbound.recv().await
    }

    /// Alias for `recv`, matching `spec.md` §6 "`read()`/`write()` aliases".
    pub async fn read(&self) -> Option<T> {
        self.recv().await
    }

    /// Alias for `send`, matching `spec.md` §6 "`read()`/`write()` aliases".
    pub async fn write(&self, obj: T) -> Result<(), mpsc::error::SendError<T>> {
        self.send(obj).await
    }
}

/// Build the two ends of a named pipe: `(user_side, automaton_side)`.
/// Sending on one side is received on the other.
pub fn pipe_pair<T: Send + 'static>(capacity: usize) -> (IoEndpoint<T>, IoEndpoint<T>) {
    let (user_to_automaton_tx, user_to_automaton_rx) = ObjectPipe::new(capacity);
    let (automaton_to_user_tx, automaton_to_user_rx) = ObjectPipe::new(capacity);

    let user_side = IoEndpoint { outbound: user_to_automaton_tx, inbound: automaton_to_user_rx };
    let automaton_side =
        IoEndpoint { outbound: automaton_to_user_tx, inbound: user_to_automaton_rx };

    (user_side, automaton_side)
}

#[cfg(test)]
#[path = "pipe_tests.rs"]
mod tests;
