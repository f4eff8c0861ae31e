//! The shared story: an append-only word sequence gated by the injected
//! word checker. A story is owned exclusively by one game and never
//! shrinks.

use std::sync::Arc;

use common::types::PlayerId;
use common::validity::TextChecker;

use crate::errors::EngineError;

/// One accepted word and the player who contributed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    text: String,
    author: PlayerId,
}

impl Word {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn author(&self) -> &PlayerId {
        &self.author
    }
}

/// The story as typed so far in one game instance.
pub struct Story {
    words: Vec<Word>,
    word_checker: Arc<dyn TextChecker>,
}

impl Story {
    #[must_use]
    pub fn new(word_checker: Arc<dyn TextChecker>) -> Self {
        Self {
            words: Vec::new(),
            word_checker,
        }
    }

    /// Append a word if the checker admits it; the story is untouched on
    /// rejection.
    pub fn try_append(&mut self, author: &PlayerId, word: &str) -> Result<(), EngineError> {
        if !self.word_checker.is_valid(word) {
            return Err(EngineError::InvalidWord);
        }
        self.words.push(Word {
            text: word.to_string(),
            author: author.clone(),
        });
        Ok(())
    }

    #[must_use]
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The story text: accepted words joined by single spaces.
    #[must_use]
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(Word::text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use common::validity::BasicWordChecker;

    fn story() -> Story {
        Story::new(Arc::new(BasicWordChecker))
    }

    #[test]
    fn test_accepted_words_append_in_order() {
        let mut story = story();
        let alice = PlayerId::from("1");
        let bob = PlayerId::from("2");

        story.try_append(&alice, "once").unwrap();
        story.try_append(&bob, "upon").unwrap();

        assert_eq!(story.len(), 2);
        assert_eq!(story.text(), "once upon");
        assert_eq!(story.words()[0].author(), &alice);
        assert_eq!(story.words()[1].author(), &bob);
    }

    #[test]
    fn test_rejected_word_leaves_story_unchanged() {
        let mut story = story();
        let alice = PlayerId::from("1");

        story.try_append(&alice, "once").unwrap();
        let result = story.try_append(&alice, "two words");

        assert!(matches!(result, Err(EngineError::InvalidWord)));
        assert_eq!(story.len(), 1);
        assert_eq!(story.text(), "once");
    }

    #[test]
    fn test_empty_story_text() {
        assert_eq!(story().text(), "");
        assert!(story().is_empty());
    }
}
