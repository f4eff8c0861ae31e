//! Per-player turn statistics.
//!
//! Each metric is an independently pluggable collector invoked by the game
//! on every *accepted* submission (timeouts record nothing). Collectors are
//! owned by their game actor, so they are plain mutable state with no
//! internal locking. Snapshots are append-only ledgers: players removed
//! from the roster keep their historical values but receive no further
//! updates.

use std::collections::HashMap;
use std::sync::Arc;

use common::types::PlayerId;
use serde::Serialize;

/// One per-player metric collector.
pub trait TurnMetric: Send {
    /// Stable metric name used as the snapshot key.
    fn name(&self) -> &'static str;

    /// Record one accepted submission: the word and how many seconds of the
    /// turn had elapsed when it arrived.
    fn record(&mut self, player: &PlayerId, word: &str, seconds_elapsed: u32);

    /// Current per-player values.
    fn snapshot(&self) -> HashMap<PlayerId, u64>;
}

/// Counts accepted words per player.
#[derive(Debug, Default)]
pub struct WordCountMetric {
    counts: HashMap<PlayerId, u64>,
}

impl TurnMetric for WordCountMetric {
    fn name(&self) -> &'static str {
        "word_count"
    }

    fn record(&mut self, player: &PlayerId, _word: &str, _seconds_elapsed: u32) {
        *self.counts.entry(player.clone()).or_insert(0) += 1;
    }

    fn snapshot(&self) -> HashMap<PlayerId, u64> {
        self.counts.clone()
    }
}

/// Cumulative letters contributed per player.
#[derive(Debug, Default)]
pub struct LettersUsedMetric {
    letters: HashMap<PlayerId, u64>,
}

impl TurnMetric for LettersUsedMetric {
    fn name(&self) -> &'static str {
        "letters_used"
    }

    fn record(&mut self, player: &PlayerId, word: &str, _seconds_elapsed: u32) {
        let letters = word.chars().filter(|c| c.is_alphabetic()).count() as u64;
        *self.letters.entry(player.clone()).or_insert(0) += letters;
    }

    fn snapshot(&self) -> HashMap<PlayerId, u64> {
        self.letters.clone()
    }
}

/// Mean seconds of turn time consumed per accepted submission,
/// integer-rounded.
#[derive(Debug, Default)]
pub struct AverageTurnDurationMetric {
    totals: HashMap<PlayerId, (u64, u64)>,
}

impl TurnMetric for AverageTurnDurationMetric {
    fn name(&self) -> &'static str {
        "average_turn_duration"
    }

    fn record(&mut self, player: &PlayerId, _word: &str, seconds_elapsed: u32) {
        let entry = self.totals.entry(player.clone()).or_insert((0, 0));
        entry.0 += u64::from(seconds_elapsed);
        entry.1 += 1;
    }

    fn snapshot(&self) -> HashMap<PlayerId, u64> {
        self.totals
            .iter()
            .map(|(player, (sum, count))| {
                let mean = if *count == 0 { 0 } else { sum / count };
                (player.clone(), mean)
            })
            .collect()
    }
}

/// Per-game, per-player statistics: metric name -> player -> value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GameStats {
    pub per_metric: HashMap<String, HashMap<PlayerId, u64>>,
}

impl GameStats {
    /// Value of one metric for one player, if recorded.
    #[must_use]
    pub fn value(&self, metric: &str, player: &PlayerId) -> Option<u64> {
        self.per_metric.get(metric)?.get(player).copied()
    }
}

/// The set of collectors owned by one game.
pub struct MetricSet {
    metrics: Vec<Box<dyn TurnMetric>>,
}

impl MetricSet {
    #[must_use]
    pub fn new(metrics: Vec<Box<dyn TurnMetric>>) -> Self {
        Self { metrics }
    }

    /// Record an accepted submission against every collector.
    pub fn record_turn(&mut self, player: &PlayerId, word: &str, seconds_elapsed: u32) {
        for metric in &mut self.metrics {
            metric.record(player, word, seconds_elapsed);
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> GameStats {
        GameStats {
            per_metric: self
                .metrics
                .iter()
                .map(|m| (m.name().to_string(), m.snapshot()))
                .collect(),
        }
    }
}

/// Factory producing a fresh collector set for each new game.
pub type MetricsFactory = Arc<dyn Fn() -> Vec<Box<dyn TurnMetric>> + Send + Sync>;

/// The standard collector set: word count, letters used, average turn
/// duration.
#[must_use]
pub fn standard_metrics() -> Vec<Box<dyn TurnMetric>> {
    vec![
        Box::new(WordCountMetric::default()),
        Box::new(LettersUsedMetric::default()),
        Box::new(AverageTurnDurationMetric::default()),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count_increments_per_submission() {
        let mut set = MetricSet::new(standard_metrics());
        let alice = PlayerId::from("1");

        set.record_turn(&alice, "cat", 3);
        set.record_turn(&alice, "sat", 1);

        let stats = set.snapshot();
        assert_eq!(stats.value("word_count", &alice), Some(2));
    }

    #[test]
    fn test_letters_used_accumulates() {
        let mut set = MetricSet::new(standard_metrics());
        let bob = PlayerId::from("2");

        set.record_turn(&bob, "cat", 0);
        set.record_turn(&bob, "mouse", 0);

        let stats = set.snapshot();
        assert_eq!(stats.value("letters_used", &bob), Some(8));
    }

    #[test]
    fn test_average_turn_duration_is_integer_mean() {
        let mut set = MetricSet::new(standard_metrics());
        let alice = PlayerId::from("1");

        set.record_turn(&alice, "cat", 2);
        set.record_turn(&alice, "sat", 7);

        let stats = set.snapshot();
        // (2 + 7) / 2 rounds down to 4
        assert_eq!(stats.value("average_turn_duration", &alice), Some(4));
    }

    #[test]
    fn test_departed_players_keep_history() {
        let mut set = MetricSet::new(standard_metrics());
        let alice = PlayerId::from("1");
        let bob = PlayerId::from("2");

        set.record_turn(&alice, "cat", 1);
        set.record_turn(&bob, "dog", 2);
        // Bob leaves the game; nothing further is recorded for him.
        set.record_turn(&alice, "sat", 3);

        let stats = set.snapshot();
        assert_eq!(stats.value("word_count", &bob), Some(1));
        assert_eq!(stats.value("word_count", &alice), Some(2));
    }

    #[test]
    fn test_unknown_player_has_no_value() {
        let set = MetricSet::new(standard_metrics());
        assert_eq!(set.snapshot().value("word_count", &PlayerId::from("9")), None);
    }
}
