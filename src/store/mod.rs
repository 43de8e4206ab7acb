//! Collaborator data store.
//!
//! The league core only needs record CRUD by id plus the goal commands;
//! everything else (joins, ordering, constraints) is the store's business.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use tracing::warn;

use crate::api_error::ApiError;
use crate::models::{Goal, Match, MatchFilter, Player, PlayerFilter};

#[allow(async_fn_in_trait)]
pub trait LeagueStore {
    async fn get_players(&self, filter: &PlayerFilter) -> Result<Vec<Player>, ApiError>;

    async fn get_player_by_id(&self, id: &str) -> Result<Option<Player>, ApiError>;

    /// Insert or update by id. Fails with `DuplicateEmail` when the email is taken.
    async fn save_player(&self, player: &Player) -> Result<Player, ApiError>;

    async fn delete_player(&self, id: &str) -> Result<(), ApiError>;

    async fn get_matches(&self, filter: &MatchFilter) -> Result<Vec<Match>, ApiError>;

    async fn get_match_by_id(&self, id: &str) -> Result<Option<Match>, ApiError>;

    /// Insert or update the match record and rosters. Stored goals are left untouched.
    async fn save_match(&self, m: &Match) -> Result<Match, ApiError>;

    /// Append one scoring event and persist the scores and status it produced.
    async fn append_goal(&self, m: &Match, goal: &Goal) -> Result<(), ApiError>;

    /// Insert or update the match record and overwrite its goal list with
    /// `m.goals`, as a single write.
    async fn save_match_with_goals(&self, m: &Match) -> Result<Match, ApiError>;

    async fn ping(&self) -> Result<(), ApiError>;
}

/// Listing reads never fail because the store is down: they come back empty.
pub fn degrade_listing<T>(result: Result<Vec<T>, ApiError>, listing: &str) -> Result<Vec<T>, ApiError> {
    match result {
        Err(e) if e.is_unavailable() => {
            warn!(listing = %listing, error = %e, "Data store unavailable, returning empty listing");
            Ok(Vec::new())
        }
        other => other,
    }
}
