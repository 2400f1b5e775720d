use persistence::{MemoryStore, SnapshotStore, DEFAULT_STORAGE_KEY};
use proptest::prelude::*;
use session::{GameState, PurchaseOutcome, Session, SessionConfig};

#[derive(Clone, Debug)]
enum Action {
    Click,
    Upgrade { cost: u64, bonus: u64 },
    Avatar(Option<String>),
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => Just(Action::Click),
        2 => (0u64..40, 0u64..6).prop_map(|(cost, bonus)| Action::Upgrade { cost, bonus }),
        1 => proptest::option::of("[a-z]{1,8}://[a-z0-9/._-]{0,24}").prop_map(Action::Avatar),
    ]
}

/// Replays `actions` through the pure economy, counting the actions that change state.
fn replay(actions: &[Action]) -> (GameState, usize) {
    let mut state = GameState::default();
    let mut applied = 0;
    for action in actions {
        match action {
            Action::Click => state = game_econ::click(&state).state,
            Action::Upgrade { cost, bonus } => {
                match game_econ::purchase_upgrade(&state, *cost, *bonus) {
                    Ok(transition) => state = transition.state,
                    Err(_) => continue,
                }
            }
            Action::Avatar(reference) => {
                state = GameState {
                    avatar_reference: reference.clone(),
                    ..state
                }
            }
        }
        applied += 1;
    }
    (state, applied)
}

proptest! {
    #[test]
    fn session_matches_pure_replay_and_persists_it(
        actions in proptest::collection::vec(arb_action(), 0..60)
    ) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let (expected, applied) = replay(&actions);
        let store = MemoryStore::new();

        let (live, saved) = rt.block_on(async {
            let mut session = Session::new(store.clone(), &SessionConfig::default());
            session.start().await;
            for action in &actions {
                match action {
                    Action::Click => session.dispatch_click().unwrap(),
                    Action::Upgrade { cost, bonus } => {
                        let before = session.state().clone();
                        let outcome = session.dispatch_upgrade(*cost, *bonus).unwrap();
                        if !outcome.is_purchased() {
                            assert_eq!(
                                outcome,
                                PurchaseOutcome::InsufficientFunds { cost: *cost, coins: before.coins }
                            );
                            assert_eq!(session.state(), &before);
                        }
                    }
                    Action::Avatar(reference) => {
                        session.set_avatar_reference(reference.clone()).unwrap()
                    }
                }
            }
            let live = session.state().clone();
            session.flush().await;
            let saved = SnapshotStore::new(store.clone(), DEFAULT_STORAGE_KEY)
                .load()
                .await
                .unwrap();
            session.shutdown().await;
            (live, saved)
        });

        prop_assert_eq!(&live, &expected);
        if applied == 0 {
            prop_assert_eq!(saved, None);
            prop_assert_eq!(store.write_count(), 0);
        } else {
            prop_assert_eq!(saved, Some(expected));
            prop_assert!(store.write_count() >= 1);
            prop_assert!(store.write_count() <= applied);
        }
    }
}
