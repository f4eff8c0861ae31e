//! Guest-comment repository.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use common::types::StoryId;
use uuid::Uuid;

/// One guest comment on a published story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub id: Uuid,
    pub guest_name: String,
    pub text: String,
    pub posted_at: DateTime<Utc>,
}

/// In-memory comment store, keyed by story.
pub struct CommentsRepo {
    inner: RwLock<HashMap<StoryId, Vec<CommentRecord>>>,
}

impl Default for CommentsRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentsRepo {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Attach a comment to a story and return its id.
    pub fn add(&self, story_id: StoryId, guest_name: &str, text: &str) -> Uuid {
        let id = Uuid::new_v4();
        let mut comments = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        comments.entry(story_id).or_default().push(CommentRecord {
            id,
            guest_name: guest_name.to_string(),
            text: text.to_string(),
            posted_at: Utc::now(),
        });
        id
    }

    /// All comments for a story, oldest first.
    #[must_use]
    pub fn for_story(&self, story_id: StoryId) -> Vec<CommentRecord> {
        let comments = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        comments.get(&story_id).cloned().unwrap_or_default()
    }
}
