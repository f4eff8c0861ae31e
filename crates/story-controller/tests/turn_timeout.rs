//! Tests for timer-driven turn behavior.
//!
//! Uses tokio's test-util time control to verify:
//! - The countdown burns one second per scheduler tick
//! - Timeout switches the turn and resets the countdown like a submission
//! - Timeouts record no statistics for the skipped player
//! - The scheduler stops once the game is over

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]

use std::time::Duration;

use common::types::{PlayerId, RequestId};
use story_controller::config::Config;
use story_controller::errors::ResponseCode;
use story_controller::response::ResponseBody;
use story_controller::service::{EngineDeps, GameService};

fn service() -> GameService {
    let config = Config::default();
    let deps = EngineDeps::standard(&config);
    GameService::new(config, deps)
}

async fn start_two_player_game(service: &GameService) {
    let (a, b) = tokio::join!(
        service.join_pool(RequestId::from("join-1"), PlayerId::from("1"), "John"),
        service.join_pool(RequestId::from("join-2"), PlayerId::from("2"), "Kate"),
    );
    assert_eq!(a.code, ResponseCode::Ok);
    assert_eq!(b.code, ResponseCode::Ok);
    assert!(matches!(a.body, Some(ResponseBody::PoolJoined(_))));
    // Let the freshly spawned game actor register its ticker before any
    // time manipulation.
    tokio::task::yield_now().await;
}

/// Advance the paused clock one scheduler tick at a time so every tick is
/// delivered (the production ticker skips missed ticks).
async fn advance_secs(n: u32) {
    for _ in 0..n {
        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn test_countdown_burns_one_second_per_tick() {
    let service = service();
    start_two_player_game(&service).await;

    let snapshot = service.game_snapshot().await.expect("game is active");
    assert_eq!(snapshot.seconds_left_in_turn, 10);

    advance_secs(3).await;

    let snapshot = service.game_snapshot().await.expect("game is active");
    assert_eq!(snapshot.seconds_left_in_turn, 7);
    assert_eq!(
        snapshot.current_turn_player().unwrap().player_id,
        PlayerId::from("1")
    );
}

#[tokio::test(start_paused = true)]
async fn test_timeout_switches_turn_and_resets_countdown() {
    let service = service();
    start_two_player_game(&service).await;

    advance_secs(10).await;

    let snapshot = service.game_snapshot().await.expect("game is active");
    assert_eq!(
        snapshot.current_turn_player().unwrap().player_id,
        PlayerId::from("2")
    );
    assert_eq!(snapshot.seconds_left_in_turn, 10);
    assert_eq!(snapshot.story_text, "");
    assert!(!snapshot.game_over);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_records_no_statistics() {
    let service = service();
    start_two_player_game(&service).await;

    // Two full timeouts: the turn cycles A -> B -> A with no submissions.
    advance_secs(20).await;

    let snapshot = service.game_snapshot().await.expect("game is active");
    assert_eq!(
        snapshot.current_turn_player().unwrap().player_id,
        PlayerId::from("1")
    );

    let stats = service.game_stats().await.expect("game is active");
    assert_eq!(stats.value("word_count", &PlayerId::from("1")), None);
    assert_eq!(stats.value("word_count", &PlayerId::from("2")), None);
    assert_eq!(
        stats.value("average_turn_duration", &PlayerId::from("1")),
        None
    );
}

#[tokio::test(start_paused = true)]
async fn test_submission_records_elapsed_turn_time() {
    let service = service();
    start_two_player_game(&service).await;

    advance_secs(4).await;

    let response = service
        .submit_word(RequestId::from("sw-1"), PlayerId::from("1"), "cat")
        .await;
    assert_eq!(response.code, ResponseCode::Ok);

    let snapshot = service.game_snapshot().await.expect("game is active");
    assert_eq!(snapshot.seconds_left_in_turn, 10);
    assert_eq!(
        snapshot.current_turn_player().unwrap().player_id,
        PlayerId::from("2")
    );

    let stats = service.game_stats().await.expect("game is active");
    assert_eq!(
        stats.value("average_turn_duration", &PlayerId::from("1")),
        Some(4)
    );
}

#[tokio::test(start_paused = true)]
async fn test_countdown_only_decreases_between_resets() {
    let service = service();
    start_two_player_game(&service).await;

    let mut last = 10;
    for _ in 0..9 {
        advance_secs(1).await;
        let snapshot = service.game_snapshot().await.expect("game is active");
        assert!(snapshot.seconds_left_in_turn < last);
        last = snapshot.seconds_left_in_turn;
    }
}

#[tokio::test(start_paused = true)]
async fn test_scheduler_stops_on_game_over() {
    let service = service();
    start_two_player_game(&service).await;

    let response = service
        .disconnect(RequestId::from("dc-1"), PlayerId::from("2"))
        .await;
    assert_eq!(response.code, ResponseCode::Ok);

    // Let the forwarded removal and the game-over transition settle.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    let snapshot = service.game_snapshot().await.expect("slot retains the game");
    assert!(snapshot.game_over);
    let frozen = snapshot.seconds_left_in_turn;

    // No tick may fire after the terminal transition.
    advance_secs(30).await;

    let snapshot = service.game_snapshot().await.expect("slot retains the game");
    assert!(snapshot.game_over);
    assert_eq!(snapshot.seconds_left_in_turn, frozen);
}
