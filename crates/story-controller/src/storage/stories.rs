//! Published-story repository.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use common::types::StoryId;

use crate::errors::EngineError;

/// One finished, published story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryRecord {
    pub id: StoryId,
    pub text: String,
    pub published_at: DateTime<Utc>,
    pub likes: u64,
}

struct StoryStore {
    /// Keyed by id; ids are assigned sequentially, so iteration order is
    /// publication order.
    stories: BTreeMap<StoryId, StoryRecord>,
    next_id: u64,
}

/// In-memory story store.
pub struct StoryRepo {
    inner: RwLock<StoryStore>,
}

impl Default for StoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl StoryRepo {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoryStore {
                stories: BTreeMap::new(),
                next_id: 0,
            }),
        }
    }

    /// Publish a finished story and return its id.
    pub fn publish(&self, text: String) -> StoryId {
        let mut store = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let id = StoryId(store.next_id);
        store.next_id += 1;
        store.stories.insert(
            id,
            StoryRecord {
                id,
                text,
                published_at: Utc::now(),
                likes: 0,
            },
        );
        id
    }

    /// The `count` most recently published stories, newest first.
    #[must_use]
    pub fn latest(&self, count: usize) -> Vec<StoryRecord> {
        let store = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        store
            .stories
            .values()
            .rev()
            .take(count)
            .cloned()
            .collect()
    }

    /// The `count` most liked stories, most likes first; publication order
    /// breaks ties (newer first).
    #[must_use]
    pub fn most_liked(&self, count: usize) -> Vec<StoryRecord> {
        let store = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut stories: Vec<StoryRecord> = store.stories.values().cloned().collect();
        stories.sort_by(|a, b| b.likes.cmp(&a.likes).then(b.id.cmp(&a.id)));
        stories.truncate(count);
        stories
    }

    /// Record one like; atomic per key.
    pub fn like(&self, id: StoryId) -> Result<u64, EngineError> {
        let mut store = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let record = store
            .stories
            .get_mut(&id)
            .ok_or(EngineError::StoryNotFound(id))?;
        record.likes += 1;
        Ok(record.likes)
    }

    #[must_use]
    pub fn get(&self, id: StoryId) -> Option<StoryRecord> {
        let store = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        store.stories.get(&id).cloned()
    }

    #[must_use]
    pub fn exists(&self, id: StoryId) -> bool {
        let store = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        store.stories.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        let store = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        store.stories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
