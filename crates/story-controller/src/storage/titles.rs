//! Suggested-title repository.
//!
//! Titles are suggested per published story and upvoted by other players.
//! Suggesting a title that already exists for the story counts as an
//! upvote for it.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use common::types::StoryId;

use crate::errors::EngineError;

/// One suggested title and its upvote count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleRecord {
    pub text: String,
    pub upvotes: u64,
}

/// In-memory suggested-title store, keyed by story.
pub struct TitlesRepo {
    inner: RwLock<HashMap<StoryId, Vec<TitleRecord>>>,
}

impl Default for TitlesRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TitlesRepo {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Suggest a title for a story. A fresh title starts with one upvote
    /// (the suggester's); re-suggesting an existing title upvotes it.
    pub fn suggest(&self, story_id: StoryId, title: &str) -> u64 {
        let mut titles = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let entries = titles.entry(story_id).or_default();
        if let Some(existing) = entries.iter_mut().find(|t| t.text == title) {
            existing.upvotes += 1;
            existing.upvotes
        } else {
            entries.push(TitleRecord {
                text: title.to_string(),
                upvotes: 1,
            });
            1
        }
    }

    /// Upvote an existing suggested title; atomic per key.
    pub fn upvote(&self, story_id: StoryId, title: &str) -> Result<u64, EngineError> {
        let mut titles = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let record = titles
            .get_mut(&story_id)
            .and_then(|entries| entries.iter_mut().find(|t| t.text == title))
            .ok_or(EngineError::TitleNotFound)?;
        record.upvotes += 1;
        Ok(record.upvotes)
    }

    /// All suggested titles for a story, in suggestion order.
    #[must_use]
    pub fn all(&self, story_id: StoryId) -> Vec<TitleRecord> {
        let titles = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        titles.get(&story_id).cloned().unwrap_or_default()
    }

    /// The most upvoted title for a story, if any were suggested.
    /// Suggestion order breaks ties (earlier wins).
    #[must_use]
    pub fn most_upvoted(&self, story_id: StoryId) -> Option<TitleRecord> {
        let titles = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut best: Option<&TitleRecord> = None;
        for title in titles.get(&story_id)? {
            if best.map_or(true, |b| title.upvotes > b.upvotes) {
                best = Some(title);
            }
        }
        best.cloned()
    }
}
