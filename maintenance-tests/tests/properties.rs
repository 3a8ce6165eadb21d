#![forbid(unsafe_code)]

use maintenance_tests::{scripted_wallet, Harness};
use proptest::collection::vec;
use proptest::prelude::*;
use zingo_maintenance::error::CoordinatorError;
use zingo_maintenance::testutils::ScriptedResult;
use zingo_status::sync_state::SyncState;

#[derive(Clone, Debug)]
enum Event {
    LoadWallet,
    UnloadWallet,
    Sync { replaying: bool },
    ForgetSync,
}

fn event() -> impl Strategy<Value = Event> {
    prop_oneof![
        3 => Just(Event::LoadWallet),
        1 => Just(Event::UnloadWallet),
        3 => any::<bool>().prop_map(|replaying| Event::Sync { replaying }),
        1 => Just(Event::ForgetSync),
    ]
}

fn routine_result() -> impl Strategy<Value = ScriptedResult> {
    prop_oneof![
        4 => (0usize..3).prop_map(ScriptedResult::Actions),
        1 => Just(ScriptedResult::CredentialRequired),
        1 => Just(ScriptedResult::Fail("corrupt".to_string())),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn advisory_is_presented_at_most_once(
        events in vec(event(), 0..40),
        script in vec(routine_result(), 0..6),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let harness = Harness::start();
            let wallet = scripted_wallet(script);
            for event in events {
                match event {
                    Event::LoadWallet => harness.load_wallet(&wallet),
                    Event::UnloadWallet => harness.wallet_source.clear(),
                    Event::Sync { replaying: true } => harness.sync(SyncState::catching_up()),
                    Event::Sync { replaying: false } => harness.sync(SyncState::caught_up()),
                    Event::ForgetSync => harness.sync_source.clear(),
                }
                tokio::task::yield_now().await;
            }

            let (result, presenter) = harness.close_and_join().await;
            prop_assert!(presenter.count() <= 1);
            prop_assert!(wallet.max_in_flight() <= 1);
            match result {
                Ok(summary) => {
                    prop_assert_eq!(summary.advisory_shown(), presenter.count() == 1);
                    prop_assert_eq!(summary.evaluations(), wallet.calls());
                }
                Err(CoordinatorError::Evaluation(_)) => prop_assert_eq!(presenter.count(), 0),
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
            Ok(())
        })?;
    }

    #[test]
    fn never_evaluates_while_replaying(events in vec(any::<bool>(), 0..20)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            let harness = Harness::start();
            let wallet = scripted_wallet([ScriptedResult::Actions(1)]);
            for load in events {
                if load {
                    harness.load_wallet(&wallet);
                } else {
                    harness.sync(SyncState::catching_up());
                }
                tokio::task::yield_now().await;
            }

            let (result, presenter) = harness.close_and_join().await;
            prop_assert_eq!(result.map(|summary| summary.evaluations()).ok(), Some(0));
            prop_assert_eq!(wallet.calls(), 0);
            prop_assert_eq!(presenter.count(), 0);
            Ok(())
        })?;
    }
}
