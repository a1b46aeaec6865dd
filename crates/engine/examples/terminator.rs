// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Two-state terminator: `A` fires an immediate condition straight into the
//! final state `B`, matching `spec.md` §8 scenario S1.

use std::collections::HashMap;
use std::sync::Arc;

use automaton::{
    ArgPack, AutomatonBuilder, AutomatonConfig, AutomatonCore, ConditionDescriptor,
    ConditionKind, ConditionOutcome, StateDescriptor, StateName, SystemClock, TransitionRequest,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("automaton=debug").init();

    let definition = AutomatonBuilder::new()
        .state(StateDescriptor::new("A", Arc::new(|_args| ArgPack::empty())).initial())
        .state(StateDescriptor::new("B", Arc::new(|args| args.clone())).terminal())
        .condition(ConditionDescriptor {
            kind: ConditionKind::Immediate,
            state: StateName::new("A"),
            priority: 0,
            name: "unconditional".to_owned(),
            body: Arc::new(|_out, _event| {
                ConditionOutcome::Transition(
                    TransitionRequest::new("B").with_enter_args(ArgPack::one(42)),
                )
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

    core.step().await.map_err(|halt| anyhow::anyhow!(halt))?;
    match core.step().await {
        Err(automaton::Halt::Terminated(value)) => println!("terminated with {value:?}"),
        other => anyhow::bail!("expected Terminated, got {other:?}"),
    }

    Ok(())
}
