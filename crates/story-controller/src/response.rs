//! Outbound response DTOs.
//!
//! Every inbound operation ultimately yields exactly one [`Response`]: a
//! code from the enumerated outcome set, optionally with a payload for the
//! presentation layer. Internal details never leak past this boundary.

use chrono::{DateTime, Utc};
use common::types::StoryId;
use serde::Serialize;
use uuid::Uuid;

use crate::actors::messages::GameSnapshot;
use crate::errors::{EngineError, ResponseCode};

/// A published story as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryView {
    pub id: StoryId,
    pub text: String,
    pub published_at: DateTime<Utc>,
    pub likes: u64,
}

/// A guest comment on a published story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub guest_name: String,
    pub text: String,
    pub posted_at: DateTime<Utc>,
}

/// A suggested title with its upvote count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleView {
    pub text: String,
    pub upvotes: u64,
}

/// Response payloads, by operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum ResponseBody {
    /// The pooled player was promoted into this game.
    PoolJoined(GameSnapshot),
    /// The pooled player's join was cancelled before promotion.
    PoolCancelled,
    /// Game state after an accepted operation.
    Turn(GameSnapshot),
    Stories(Vec<StoryView>),
    Comments(Vec<CommentView>),
    Titles(Vec<TitleView>),
}

/// One response to one inbound request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub code: ResponseCode,
    pub body: Option<ResponseBody>,
}

impl Response {
    /// `OK` with no payload.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            code: ResponseCode::Ok,
            body: None,
        }
    }

    /// `OK` carrying a payload.
    #[must_use]
    pub fn ok_with(body: ResponseBody) -> Self {
        Self {
            code: ResponseCode::Ok,
            body: Some(body),
        }
    }

    /// A bare code with no payload.
    #[must_use]
    pub fn code_only(code: ResponseCode) -> Self {
        Self { code, body: None }
    }

    /// The response for a failed operation.
    #[must_use]
    pub fn from_error(error: &EngineError) -> Self {
        Self::code_only(error.response_code())
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == ResponseCode::Ok
    }
}

impl From<Result<Response, EngineError>> for Response {
    fn from(result: Result<Response, EngineError>) -> Self {
        match result {
            Ok(response) => response,
            Err(error) => Response::from_error(&error),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error_maps_code() {
        let response = Response::from_error(&EngineError::NotYourTurn);
        assert_eq!(response.code, ResponseCode::NotYourTurn);
        assert!(response.body.is_none());
        assert!(!response.is_ok());
    }

    #[test]
    fn test_ok_constructors() {
        assert!(Response::ok().is_ok());
        let response = Response::ok_with(ResponseBody::PoolCancelled);
        assert!(response.is_ok());
        assert_eq!(response.body, Some(ResponseBody::PoolCancelled));
    }

    #[test]
    fn test_result_conversion() {
        let ok: Response = Ok::<_, EngineError>(Response::ok()).into();
        assert!(ok.is_ok());

        let err: Response = Err::<Response, _>(EngineError::GameOver).into();
        assert_eq!(err.code, ResponseCode::GameOver);
    }

    #[test]
    fn test_serializes_for_presentation() {
        let response = Response::ok_with(ResponseBody::Titles(vec![TitleView {
            text: "The Cave".to_string(),
            upvotes: 2,
        }]));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"OK\""));
        assert!(json.contains("The Cave"));
    }
}
