//! Tests driving a `GameActor` directly: roster mutation with turn-pointer
//! fix-up, mid-game joins, and the terminal transition.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use common::types::{GameId, PlayerId};
use sc_test_utils::AcceptAll;
use story_controller::actors::game::{GameActor, GameActorHandle, GameSettings};
use story_controller::actors::messages::{GameEvent, GameSnapshot};
use story_controller::errors::EngineError;
use story_controller::player::Player;
use story_controller::stats::{standard_metrics, MetricSet};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

fn roster(names: &[(&str, &str)]) -> Vec<Player> {
    names
        .iter()
        .map(|(id, name)| Player::new(PlayerId::from(*id), *name))
        .collect()
}

fn spawn_game(
    players: Vec<Player>,
) -> (
    GameActorHandle,
    watch::Receiver<GameSnapshot>,
    mpsc::Receiver<GameEvent>,
    CancellationToken,
) {
    let (events_tx, events_rx) = mpsc::channel(16);
    let cancel_token = CancellationToken::new();
    let settings = GameSettings {
        seconds_per_turn: 10,
        tick_interval: Duration::from_secs(1),
        min_players: 2,
    };
    let (handle, snapshots, _task) = GameActor::spawn(
        GameId::new(),
        players,
        settings,
        Arc::new(AcceptAll),
        MetricSet::new(standard_metrics()),
        events_tx,
        cancel_token.clone(),
    );
    (handle, snapshots, events_rx, cancel_token)
}

fn current_player(snapshot: &GameSnapshot) -> PlayerId {
    snapshot
        .current_turn_player()
        .expect("game is running")
        .player_id
        .clone()
}

#[tokio::test]
async fn test_removing_current_player_advances_turn_and_resets_countdown() {
    let (handle, snapshots, _events, _token) =
        spawn_game(roster(&[("1", "John"), ("2", "Kate"), ("3", "Nick")]));

    let removed = handle.remove_player(PlayerId::from("1")).await.unwrap();
    assert!(removed);

    let snapshot = snapshots.borrow().clone();
    assert_eq!(current_player(&snapshot), PlayerId::from("2"));
    assert_eq!(snapshot.seconds_left_in_turn, 10);
    assert_eq!(snapshot.players.len(), 2);
    assert!(!snapshot.game_over);
}

#[tokio::test]
async fn test_removing_earlier_player_keeps_current_turn() {
    let (handle, snapshots, _events, _token) =
        spawn_game(roster(&[("1", "John"), ("2", "Kate"), ("3", "Nick")]));

    // Advance the turn to Kate, then remove John (who sits before her).
    handle
        .submit_word(PlayerId::from("1"), "once".to_string())
        .await
        .unwrap();
    let removed = handle.remove_player(PlayerId::from("1")).await.unwrap();
    assert!(removed);

    let snapshot = snapshots.borrow().clone();
    assert_eq!(current_player(&snapshot), PlayerId::from("2"));
}

#[tokio::test]
async fn test_removing_last_current_player_wraps_to_first() {
    let (handle, snapshots, _events, _token) =
        spawn_game(roster(&[("1", "John"), ("2", "Kate"), ("3", "Nick")]));

    // Walk the turn to Nick at the end of the order.
    handle
        .submit_word(PlayerId::from("1"), "once".to_string())
        .await
        .unwrap();
    handle
        .submit_word(PlayerId::from("2"), "upon".to_string())
        .await
        .unwrap();

    let removed = handle.remove_player(PlayerId::from("3")).await.unwrap();
    assert!(removed);

    let snapshot = snapshots.borrow().clone();
    assert_eq!(current_player(&snapshot), PlayerId::from("1"));
}

#[tokio::test]
async fn test_remove_unknown_player_is_noop() {
    let (handle, snapshots, _events, _token) =
        spawn_game(roster(&[("1", "John"), ("2", "Kate"), ("3", "Nick")]));

    let removed = handle.remove_player(PlayerId::from("9")).await.unwrap();
    assert!(!removed);
    assert_eq!(snapshots.borrow().players.len(), 3);
}

#[tokio::test]
async fn test_mid_game_join_extends_turn_order() {
    let (handle, snapshots, _events, _token) =
        spawn_game(roster(&[("1", "John"), ("2", "Kate")]));

    let snapshot = handle
        .add_player(Player::new(PlayerId::from("3"), "Nick"))
        .await
        .unwrap();
    assert_eq!(snapshot.players.len(), 3);
    assert_eq!(current_player(&snapshot), PlayerId::from("1"));

    // The newcomer takes their place at the end of the cycle.
    handle
        .submit_word(PlayerId::from("1"), "once".to_string())
        .await
        .unwrap();
    handle
        .submit_word(PlayerId::from("2"), "upon".to_string())
        .await
        .unwrap();
    assert_eq!(current_player(&snapshots.borrow()), PlayerId::from("3"));
}

#[tokio::test]
async fn test_mid_game_join_rejects_seated_id() {
    let (handle, _snapshots, _events, _token) =
        spawn_game(roster(&[("1", "John"), ("2", "Kate")]));

    let result = handle
        .add_player(Player::new(PlayerId::from("2"), "Kate Again"))
        .await;
    assert!(matches!(result, Err(EngineError::IdInUse)));
}

#[tokio::test]
async fn test_roster_below_minimum_ends_game() {
    let (handle, snapshots, mut events, _token) =
        spawn_game(roster(&[("1", "John"), ("2", "Kate")]));

    handle
        .submit_word(PlayerId::from("1"), "once".to_string())
        .await
        .unwrap();
    let removed = handle.remove_player(PlayerId::from("2")).await.unwrap();
    assert!(removed);

    // First the roster change, then the terminal transition.
    let event = events.recv().await.unwrap();
    assert!(matches!(event, GameEvent::PlayerRemoved { .. }));
    let event = events.recv().await.unwrap();
    match event {
        GameEvent::Ended {
            final_snapshot,
            stats,
            ..
        } => {
            assert!(final_snapshot.game_over);
            assert_eq!(final_snapshot.story_text, "once");
            assert_eq!(stats.value("word_count", &PlayerId::from("1")), Some(1));
        }
        other => panic!("expected Ended event, got {other:?}"),
    }

    assert!(snapshots.borrow().game_over);

    // Every further mutation reports the game-over signal and changes
    // nothing.
    let result = handle
        .submit_word(PlayerId::from("1"), "sat".to_string())
        .await;
    assert!(matches!(result, Err(EngineError::GameOver)));
    let result = handle.remove_player(PlayerId::from("1")).await;
    assert!(matches!(result, Err(EngineError::GameOver)));
    let result = handle
        .add_player(Player::new(PlayerId::from("3"), "Nick"))
        .await;
    assert!(matches!(result, Err(EngineError::GameOver)));
    assert_eq!(snapshots.borrow().story_text, "once");
}

#[tokio::test]
async fn test_statistics_survive_departure() {
    let (handle, _snapshots, _events, _token) =
        spawn_game(roster(&[("1", "John"), ("2", "Kate"), ("3", "Nick")]));

    handle
        .submit_word(PlayerId::from("1"), "once".to_string())
        .await
        .unwrap();
    handle
        .submit_word(PlayerId::from("2"), "upon".to_string())
        .await
        .unwrap();
    handle.remove_player(PlayerId::from("2")).await.unwrap();

    let stats = handle.stats().await.unwrap();
    assert_eq!(stats.value("word_count", &PlayerId::from("2")), Some(1));
    assert_eq!(stats.value("letters_used", &PlayerId::from("2")), Some(4));
}

#[tokio::test]
async fn test_cancelled_actor_reports_game_over_to_callers() {
    let (handle, _snapshots, _events, token) =
        spawn_game(roster(&[("1", "John"), ("2", "Kate")]));

    token.cancel();
    // Give the actor a moment to observe cancellation and drop its mailbox.
    tokio::time::sleep(Duration::from_millis(20)).await;

    let result = handle
        .submit_word(PlayerId::from("1"), "cat".to_string())
        .await;
    assert!(matches!(result, Err(EngineError::GameOver)));
}
