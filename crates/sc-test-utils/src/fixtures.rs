//! Pre-configured checkers and identities for engine tests.

use common::types::PlayerId;
use common::validity::TextChecker;

/// A checker that accepts every input.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl TextChecker for AcceptAll {
    fn is_valid(&self, _text: &str) -> bool {
        true
    }
}

/// A checker that rejects every input.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

impl TextChecker for RejectAll {
    fn is_valid(&self, _text: &str) -> bool {
        false
    }
}

/// A checker that rejects exactly one word and accepts everything else.
#[derive(Debug, Clone)]
pub struct RejectWord(pub String);

impl RejectWord {
    #[must_use]
    pub fn new(word: impl Into<String>) -> Self {
        Self(word.into())
    }
}

impl TextChecker for RejectWord {
    fn is_valid(&self, text: &str) -> bool {
        text != self.0
    }
}

/// Build a fixed-size array of player ids from string literals.
#[must_use]
pub fn player_ids<const N: usize>(ids: [&str; N]) -> [PlayerId; N] {
    ids.map(PlayerId::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_checkers() {
        assert!(AcceptAll.is_valid(""));
        assert!(!RejectAll.is_valid("word"));
    }

    #[test]
    fn test_reject_word_is_selective() {
        let checker = RejectWord::new("banned");
        assert!(!checker.is_valid("banned"));
        assert!(checker.is_valid("allowed"));
    }
}
