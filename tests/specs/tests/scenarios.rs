// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenario tests, one per `spec.md` §8 example, driven against
//! the public `automaton` API rather than any internal module.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use automaton::{
    ActionDescriptor, ArgPack, AutomatonBuilder, AutomatonConfig, AutomatonCore,
    ConditionDescriptor, ConditionEvent, ConditionKind, ConditionOutcome, Halt, Runner,
    StateDescriptor, StateName, SystemClock, TransitionRequest, pipe_pair,
};
use automaton_specs::{KindPacket, RecordingSocket, ScriptedSocket};
use tokio_util::sync::CancellationToken;

fn immediate(state: &str, name: &str, target: &str, priority: i32) -> ConditionDescriptor {
    let target = target.to_owned();
    ConditionDescriptor {
        kind: ConditionKind::Immediate,
        state: StateName::new(state),
        priority,
        name: name.to_owned(),
        body: Arc::new(move |_out, _event| {
            ConditionOutcome::Transition(TransitionRequest::new(target.clone()))
        }),
    }
}

/// S1: two-state terminator — an unconditional immediate transition into a
/// final state carries its `enter_args` through as the run's return value,
/// and the session log stays empty (no packets were ever involved).
#[tokio::test]
async fn s1_two_state_terminator_reaches_final_value() {
    let definition = AutomatonBuilder::new()
        .state(StateDescriptor::new("A", Arc::new(|_args| ArgPack::empty())).initial())
        .state(StateDescriptor::new("B", Arc::new(|args| args.clone())).terminal())
        .condition(ConditionDescriptor {
            kind: ConditionKind::Immediate,
            state: StateName::new("A"),
            priority: 0,
            name: "to_b".to_owned(),
            body: Arc::new(|_out, _event: ConditionEvent<'_>| {
                ConditionOutcome::Transition(
                    TransitionRequest::new("B").with_enter_args(ArgPack::one(42)),
                )
            }),
        })
        .build()
        .expect("valid automaton");

    let core = AutomatonCore::start(
        Arc::new(definition),
        AutomatonConfig::default(),
        Arc::new(SystemClock),
        None,
        None,
        HashMap::new(),
        ArgPack::empty(),
    );
    let mut runner = Runner::new(core);

    let value = runner.run(&CancellationToken::new()).await.expect("reaches B");
    assert_eq!(value.get(0), Some(&serde_json::Value::from(42)));
}

/// S2: timeout handshake — `resend` fires exactly once, well before
/// `giveup` transitions out, with real (short) wall-clock deadlines.
#[tokio::test]
async fn s2_timeout_handshake_resends_once_then_gives_up() {
    let resend_count = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&resend_count);

    let definition = AutomatonBuilder::new()
        .state(StateDescriptor::new("WAIT", Arc::new(|_args| ArgPack::empty())).initial())
        .state(StateDescriptor::new("GIVEUP", Arc::new(|_args| ArgPack::empty())).terminal())
        .condition(ConditionDescriptor {
            kind: ConditionKind::Timeout { deadline: Duration::from_millis(10) },
            state: StateName::new("WAIT"),
            priority: 0,
            name: "resend".to_owned(),
            body: Arc::new(move |_out, _event| {
                counted.fetch_add(1, Ordering::SeqCst);
                ConditionOutcome::NoTransition
            }),
        })
        .condition(ConditionDescriptor {
            kind: ConditionKind::Timeout { deadline: Duration::from_millis(40) },
            state: StateName::new("WAIT"),
            priority: 0,
            name: "giveup".to_owned(),
            body: Arc::new(|_out, _event| {
                ConditionOutcome::Transition(TransitionRequest::new("GIVEUP"))
            }),
        })
        .build()
        .expect("valid automaton");

    let mut core = AutomatonCore::start(
        Arc::new(definition),
        AutomatonConfig::default(),
        Arc::new(SystemClock),
        None,
        None,
        HashMap::new(),
        ArgPack::empty(),
    );

    let halt = loop {
        match core.step().await {
            Ok(_) => continue,
            Err(halt) => break halt,
        }
    };
    assert!(matches!(halt, Halt::Terminated(_)));
    assert_eq!(resend_count.load(Ordering::SeqCst), 1);
}

/// S3: receive path — of three injected packets, only the one matching
/// `kind == 7` fires the condition; the triggering packet lands in the
/// session log.
#[tokio::test]
async fn s3_receive_condition_fires_only_on_matching_packet() {
    let definition = AutomatonBuilder::new()
        .state(StateDescriptor::new("LISTEN", Arc::new(|_args| ArgPack::empty())).initial())
        .state(StateDescriptor::new("MATCHED", Arc::new(|_args| ArgPack::empty())).terminal())
        .condition(ConditionDescriptor {
            kind: ConditionKind::Receive,
            state: StateName::new("LISTEN"),
            priority: 0,
            name: "on_kind_7".to_owned(),
            body: Arc::new(|_out, event| match event {
                ConditionEvent::Packet(packet) => {
                    let summary = packet.summary();
                    if summary.contains("kind=7") {
                        ConditionOutcome::Transition(TransitionRequest::new("MATCHED"))
                    } else {
                        ConditionOutcome::NoTransition
                    }
                }
                _ => ConditionOutcome::NoTransition,
            }),
        })
        .build()
        .expect("valid automaton");

    let listening = ScriptedSocket::new([KindPacket::new(1), KindPacket::new(7), KindPacket::new(9)]);
    let mut core = AutomatonCore::start(
        Arc::new(definition),
        AutomatonConfig::default(),
        Arc::new(SystemClock),
        Some(Box::new(listening)),
        None,
        HashMap::new(),
        ArgPack::empty(),
    );

    let committed = core.step().await.expect("kind=7 packet commits the transition");
    assert_eq!(committed.target, StateName::new("MATCHED"));
    assert_eq!(core.session_log().len(), 1);
    assert_eq!(core.session_log()[0].summary(), "KindPacket(kind=7)");
}

/// S4: I/O event — delivering on a named pipe fires the bound condition and
/// the delivered value is exactly what was sent.
#[tokio::test]
async fn s4_io_event_condition_fires_on_pipe_delivery() {
    let definition = AutomatonBuilder::new()
        .state(StateDescriptor::new("IDLE", Arc::new(|_args| ArgPack::empty())).initial())
        .state(StateDescriptor::new("ACK", Arc::new(|_args| ArgPack::empty())).terminal())
        .condition(ConditionDescriptor {
            kind: ConditionKind::IoEvent { pipe_name: "cmd".to_owned() },
            state: StateName::new("IDLE"),
            priority: 0,
            name: "on_cmd".to_owned(),
            body: Arc::new(|_out, _event| {
                ConditionOutcome::Transition(TransitionRequest::new("ACK"))
            }),
        })
        .build()
        .expect("valid automaton");

    let (user_side, automaton_side) = pipe_pair(4);
    let mut pipes = HashMap::new();
    pipes.insert("cmd".to_owned(), automaton_side);

    let mut core = AutomatonCore::start(
        Arc::new(definition),
        AutomatonConfig::default(),
        Arc::new(SystemClock),
        None,
        None,
        pipes,
        ArgPack::empty(),
    );

    user_side.send(serde_json::json!("go")).await.expect("user side is open");
    let committed = core.step().await.expect("pipe delivery commits the transition");
    assert_eq!(committed.target, StateName::new("ACK"));
}

/// S5: breakpoint resumption — pausing at a state raises once, then a
/// second `step` continues past it without re-raising.
#[tokio::test]
async fn s5_breakpoint_pauses_once_then_resumes() {
    let definition = AutomatonBuilder::new()
        .state(StateDescriptor::new("MID", Arc::new(|_args| ArgPack::empty())).initial())
        .state(StateDescriptor::new("END", Arc::new(|_args| ArgPack::empty())).terminal())
        .condition(immediate("MID", "to_end", "END", 0))
        .build()
        .expect("valid automaton");

    let mut core = AutomatonCore::start(
        Arc::new(definition),
        AutomatonConfig::default(),
        Arc::new(SystemClock),
        None,
        None,
        HashMap::new(),
        ArgPack::empty(),
    );
    core.add_breakpoint(StateName::new("MID"));

    let halt = core.step().await.expect_err("first entry pauses");
    assert!(matches!(halt, Halt::Breakpoint(_)));

    let committed = core.step().await.expect("second step resumes without re-raising");
    assert_eq!(committed.target, StateName::new("END"));
}

/// S6: stuck detection — a state with no conditions at all and only the
/// sentinel timeout halts immediately after its body runs.
#[tokio::test]
async fn s6_dead_end_state_raises_stuck() {
    let definition = AutomatonBuilder::new()
        .state(StateDescriptor::new("DEAD", Arc::new(|_args| ArgPack::one("output"))).initial())
        .build()
        .expect("a lone dead-end state is still a valid automaton");

    let mut core = AutomatonCore::start(
        Arc::new(definition),
        AutomatonConfig::default(),
        Arc::new(SystemClock),
        None,
        None,
        HashMap::new(),
        ArgPack::empty(),
    );

    let halt = core.step().await.expect_err("DEAD has no way out");
    match halt {
        Halt::Stuck(output) => assert_eq!(output.get(0), Some(&serde_json::Value::from("output"))),
        other => panic!("expected Stuck, got {other:?}"),
    }
}

/// `send` appends a structural copy of the packet to the session log, not
/// the packet itself — the log is readable independent of what the caller
/// does with their own packet afterwards.
#[tokio::test]
async fn send_appends_a_copy_to_the_session_log() {
    let definition = AutomatonBuilder::new()
        .state(StateDescriptor::new("ONLY", Arc::new(|_args| ArgPack::empty())).initial().terminal())
        .build()
        .expect("single terminal state is valid");

    let sending = RecordingSocket::new();
    let mut core = AutomatonCore::start(
        Arc::new(definition),
        AutomatonConfig::default(),
        Arc::new(SystemClock),
        None,
        Some(Box::new(sending)),
        HashMap::new(),
        ArgPack::empty(),
    );

    let packet = KindPacket::new(3);
    core.send(&packet).await.expect("sending socket is configured");
    assert_eq!(core.session_log().len(), 1);
    assert_eq!(core.session_log()[0].summary(), "KindPacket(kind=3)");
}

/// `spec.md` §8 testable property 2: actions attached to the same condition
/// run in ascending priority order, regardless of the order they were
/// registered on the builder.
#[tokio::test]
async fn actions_fire_in_ascending_priority_order() {
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));

    let recorder = |label: &'static str, order: Arc<std::sync::Mutex<Vec<&'static str>>>| {
        ActionDescriptor::new(label, Arc::new(move |_args: &ArgPack| {
            order.lock().expect("not poisoned").push(label);
            Ok(())
        }))
    };

    let definition = AutomatonBuilder::new()
        .state(StateDescriptor::new("A", Arc::new(|_args| ArgPack::empty())).initial())
        .state(StateDescriptor::new("B", Arc::new(|_args| ArgPack::empty())).terminal())
        .condition(immediate("A", "to_b", "B", 0))
        .action(recorder("registered_second", Arc::clone(&order)).for_condition("to_b", 5))
        .action(recorder("registered_first", Arc::clone(&order)).for_condition("to_b", 1))
        .build()
        .expect("valid automaton");

    let mut core = AutomatonCore::start(
        Arc::new(definition),
        AutomatonConfig::default(),
        Arc::new(SystemClock),
        None,
        None,
        HashMap::new(),
        ArgPack::empty(),
    );

    core.step().await.expect("immediate transition commits and runs both actions");
    let fired = order.lock().expect("not poisoned").clone();
    assert_eq!(fired, vec!["registered_first", "registered_second"]);
}

/// `spec.md` §4.3 "Commit of a transition request": an action that returns
/// an error aborts the step and leaves the automaton at its pre-transition
/// state.
#[tokio::test]
async fn failing_action_aborts_the_transition_and_leaves_state_unchanged() {
    let action = ActionDescriptor::new(
        "always_fails",
        Arc::new(|_args: &ArgPack| anyhow::bail!("action exploded")),
    )
    .for_condition("to_b", 0);

    let definition = AutomatonBuilder::new()
        .state(StateDescriptor::new("A", Arc::new(|_args| ArgPack::empty())).initial())
        .state(StateDescriptor::new("B", Arc::new(|_args| ArgPack::empty())).terminal())
        .condition(immediate("A", "to_b", "B", 0))
        .action(action)
        .build()
        .expect("valid automaton");

    let mut core = AutomatonCore::start(
        Arc::new(definition),
        AutomatonConfig::default(),
        Arc::new(SystemClock),
        None,
        None,
        HashMap::new(),
        ArgPack::empty(),
    );

    let halt = core.step().await.expect_err("the action fails");
    match halt {
        Halt::ActionFailed { condition, .. } => assert_eq!(condition, "to_b"),
        other => panic!("expected ActionFailed, got {other:?}"),
    }
    assert_eq!(core.current_state(), &StateName::new("A"));
}
