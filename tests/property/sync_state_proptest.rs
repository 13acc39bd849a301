//! Property-based tests for the sync state store

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use qualiflow::egui_app::sync::{SyncPhase, SyncState, SyncStateStore};

#[derive(Debug, Clone)]
enum Op {
    /// Successful attempt finishing at the given offset in seconds
    Complete(i64),
    Fail,
    /// Attempt fenced off by a reset before it completes
    FencedComplete(i64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0i64..10_000).prop_map(Op::Complete),
        Just(Op::Fail),
        (0i64..10_000).prop_map(Op::FencedComplete),
    ]
}

fn at(offset: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::seconds(offset)
}

async fn apply(ops: Vec<Op>) -> Vec<(Op, SyncState)> {
    let store = SyncStateStore::spawn();
    let mut history = Vec::with_capacity(ops.len());

    for op in ops {
        let token = store.try_begin("documents").await.unwrap().unwrap();
        match &op {
            Op::Complete(offset) => store.complete(token, at(*offset)).unwrap(),
            Op::Fail => store.fail(token, "HTTP 500: boom").unwrap(),
            Op::FencedComplete(offset) => {
                store.reset_all().unwrap();
                store.complete(token, at(*offset)).unwrap();
            }
        }
        history.push((op, store.snapshot("documents").await.unwrap()));
    }
    history
}

fn run(ops: Vec<Op>) -> Vec<(Op, SyncState)> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(apply(ops))
}

proptest! {
    #[test]
    fn test_last_synced_is_the_latest_completion(ops in prop::collection::vec(op(), 1..20)) {
        let mut expected: Option<DateTime<Utc>> = None;

        for (op, state) in run(ops) {
            if let Op::Complete(offset) = op {
                expected = expected.max(Some(at(offset)));
            }
            prop_assert_eq!(state.last_synced, expected);
        }
    }

    #[test]
    fn test_phase_follows_the_last_counted_attempt(ops in prop::collection::vec(op(), 1..20)) {
        let mut previous = SyncState::default();

        for (op, state) in run(ops) {
            prop_assert!(!state.is_syncing());
            match op {
                Op::Complete(_) => {
                    prop_assert_eq!(state.phase, SyncPhase::Synced);
                    prop_assert_eq!(state.error_message.as_deref(), None);
                }
                Op::Fail => {
                    prop_assert!(state.sync_failed());
                    prop_assert_eq!(state.last_synced, previous.last_synced);
                }
                Op::FencedComplete(_) => {
                    // The stale result is dropped; reset only leaves Syncing
                    let expected = if state.last_synced.is_some() {
                        SyncPhase::Synced
                    } else {
                        SyncPhase::Idle
                    };
                    prop_assert_eq!(state.phase, expected);
                    prop_assert_eq!(state.last_synced, previous.last_synced);
                }
            }
            previous = state;
        }
    }
}
