// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeout handshake: `WAIT` resends once at 100ms then gives up at 500ms
//! with no packets ever arriving, matching `spec.md` §8 scenario S2.
//!
//! The resend condition returns [`ConditionOutcome::NoTransition`] — firing
//! it does not leave `WAIT`, so the dispatch loop's entry time (and the rest
//! of the timeout cursor) carries on unchanged rather than resetting, which
//! is what lets `giveup` still land at ~0.5s after the original entry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use automaton::{
    ArgPack, AutomatonBuilder, AutomatonConfig, AutomatonCore, ConditionDescriptor, ConditionKind,
    ConditionOutcome, Halt, StateDescriptor, StateName, SystemClock, TransitionRequest,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("automaton=debug").init();

    let resend_count = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&resend_count);

    let definition = AutomatonBuilder::new()
        .state(StateDescriptor::new("WAIT", Arc::new(|_args| ArgPack::empty())).initial())
        .state(StateDescriptor::new("GIVEUP", Arc::new(|_args| ArgPack::empty())).terminal())
        .condition(ConditionDescriptor {
            kind: ConditionKind::Timeout { deadline: Duration::from_millis(100) },
            state: StateName::new("WAIT"),
            priority: 0,
            name: "resend".to_owned(),
            body: Arc::new(move |_out, _event| {
                counted.fetch_add(1, Ordering::SeqCst);
                ConditionOutcome::NoTransition
            }),
        })
        .condition(ConditionDescriptor {
            kind: ConditionKind::Timeout { deadline: Duration::from_millis(500) },
            state: StateName::new("WAIT"),
            priority: 0,
            name: "giveup".to_owned(),
            body: Arc::new(|_out, _event| {
                ConditionOutcome::Transition(TransitionRequest::new("GIVEUP"))
            }),
        })
        .build()?;

    let mut core = AutomatonCore::start(
        Arc::new(definition),
        AutomatonConfig::default(),
        Arc::new(SystemClock),
        None,
        None,
        HashMap::new(),
        ArgPack::empty(),
    );

    loop {
        match core.step().await {
            Ok(request) => println!("transitioned to {:?}", request.target),
            Err(Halt::Terminated(_)) => break,
            Err(other) => anyhow::bail!(other),
        }
    }

    println!("resend fired {} time(s)", resend_count.load(Ordering::SeqCst));
    Ok(())
}
