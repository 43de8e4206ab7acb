use actix_web::{dev::Payload, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use tracing::debug;

use crate::api_error::ApiError;

/// Header carrying the acting player's id.
pub const PLAYER_HEADER: &str = "X-Player-Id";

/// Identity of the player acting on a request, passed explicitly to the
/// operations that need one. Anonymous when the header is absent or blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub player_id: Option<String>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_player(player_id: impl Into<String>) -> Self {
        Self {
            player_id: Some(player_id.into()),
        }
    }

    pub fn require_player(&self) -> Result<&str, ApiError> {
        self.player_id.as_deref().ok_or(ApiError::Unauthorized)
    }
}

impl FromRequest for SessionContext {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let player_id = req
            .headers()
            .get(PLAYER_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        if let Some(ref id) = player_id {
            debug!(player_id = %id, "Request carries a session player");
        }

        ready(Ok(SessionContext { player_id }))
    }
}
