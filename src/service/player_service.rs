use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::api_error::ApiError;
use crate::models::{Player, PlayerAvatar, PlayerFilter, SavePlayerRequest};
use crate::service::notification_service::PlayerNotifier;
use crate::session::SessionContext;
use crate::store::{degrade_listing, LeagueStore};

pub struct PlayerService<S> {
    store: Arc<S>,
    notifier: Arc<dyn PlayerNotifier>,
    avatar_base_url: String,
}

impl<S: LeagueStore> PlayerService<S> {
    pub fn new(
        store: Arc<S>,
        notifier: Arc<dyn PlayerNotifier>,
        avatar_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifier,
            avatar_base_url: avatar_base_url.into(),
        }
    }

    pub async fn list_players(&self, filter: &PlayerFilter) -> Result<Vec<Player>, ApiError> {
        degrade_listing(self.store.get_players(filter).await, "players")
    }

    pub async fn get_player(&self, id: &str) -> Result<Player, ApiError> {
        self.store
            .get_player_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Player {} not found", id)))
    }

    /// Create a player, or update the one named by `request.id`.
    ///
    /// New players remember the session player who created them and are handed
    /// to the welcome notifier. Updates keep the stored creator and avatar style
    /// unless a new style is given.
    pub async fn save_player(
        &self,
        session: &SessionContext,
        request: SavePlayerRequest,
    ) -> Result<Player, ApiError> {
        request.validate()?;

        let player = match request.id.as_deref() {
            Some(id) => {
                let existing = self.get_player(id).await?;
                Player {
                    name: request.name.trim().to_string(),
                    email: request.email.trim().to_string(),
                    avatar_style: request.avatar_style.or(existing.avatar_style),
                    ..existing
                }
            }
            None => Player {
                id: Uuid::new_v4().to_string(),
                name: request.name.trim().to_string(),
                email: request.email.trim().to_string(),
                avatar_style: request.avatar_style,
                creator_id: session.player_id.clone(),
            },
        };

        let saved = self.store.save_player(&player).await?;
        let created = request.id.is_none();

        info!(player_id = %saved.id, created, "Player saved");
        if created {
            self.notifier.player_created(&saved);
        }
        Ok(saved)
    }

    /// Remove a player. Fails with a conflict while matches still reference them.
    pub async fn delete_player(&self, id: &str) -> Result<(), ApiError> {
        self.get_player(id).await?;
        self.store.delete_player(id).await?;
        info!(player_id = %id, "Player deleted");
        Ok(())
    }

    pub async fn avatar(&self, id: &str) -> Result<PlayerAvatar, ApiError> {
        self.get_player(id).await?.avatar(&self.avatar_base_url)
    }
}
