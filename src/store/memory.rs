use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::api_error::ApiError;
use crate::models::{Goal, Match, MatchFilter, Player, PlayerFilter};
use crate::store::LeagueStore;

/// In-process store keeping records in insertion order.
///
/// Can be switched offline to behave like an unreachable remote store.
#[derive(Default)]
pub struct MemoryStore {
    players: RwLock<Vec<Player>>,
    matches: RwLock<HashMap<String, Match>>,
    match_order: RwLock<Vec<String>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), ApiError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ApiError::upstream("memory store is offline"));
        }
        Ok(())
    }
}

fn poisoned() -> ApiError {
    ApiError::InternalServerError
}

impl LeagueStore for MemoryStore {
    async fn get_players(&self, filter: &PlayerFilter) -> Result<Vec<Player>, ApiError> {
        self.check_online()?;
        let players = self.players.read().map_err(|_| poisoned())?;
        Ok(players.iter().filter(|p| filter.matches(p)).cloned().collect())
    }

    async fn get_player_by_id(&self, id: &str) -> Result<Option<Player>, ApiError> {
        self.check_online()?;
        let players = self.players.read().map_err(|_| poisoned())?;
        Ok(players.iter().find(|p| p.id == id).cloned())
    }

    async fn save_player(&self, player: &Player) -> Result<Player, ApiError> {
        self.check_online()?;
        let mut players = self.players.write().map_err(|_| poisoned())?;

        let email_taken = players
            .iter()
            .any(|p| p.id != player.id && p.email.eq_ignore_ascii_case(&player.email));
        if email_taken {
            return Err(ApiError::DuplicateEmail(player.email.clone()));
        }

        match players.iter_mut().find(|p| p.id == player.id) {
            Some(existing) => *existing = player.clone(),
            None => players.push(player.clone()),
        }
        Ok(player.clone())
    }

    async fn delete_player(&self, id: &str) -> Result<(), ApiError> {
        self.check_online()?;
        let mut players = self.players.write().map_err(|_| poisoned())?;
        players.retain(|p| p.id != id);
        Ok(())
    }

    async fn get_matches(&self, filter: &MatchFilter) -> Result<Vec<Match>, ApiError> {
        self.check_online()?;
        let matches = self.matches.read().map_err(|_| poisoned())?;
        let order = self.match_order.read().map_err(|_| poisoned())?;
        Ok(order
            .iter()
            .filter_map(|id| matches.get(id))
            .filter(|m| filter.matches(m))
            .cloned()
            .collect())
    }

    async fn get_match_by_id(&self, id: &str) -> Result<Option<Match>, ApiError> {
        self.check_online()?;
        let matches = self.matches.read().map_err(|_| poisoned())?;
        Ok(matches.get(id).cloned())
    }

    async fn save_match(&self, m: &Match) -> Result<Match, ApiError> {
        self.check_online()?;
        let mut matches = self.matches.write().map_err(|_| poisoned())?;

        let mut record = m.clone();
        match matches.get(&m.id) {
            Some(existing) => record.goals = existing.goals.clone(),
            None => {
                let mut order = self.match_order.write().map_err(|_| poisoned())?;
                order.push(m.id.clone());
            }
        }
        matches.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn append_goal(&self, m: &Match, goal: &Goal) -> Result<(), ApiError> {
        self.check_online()?;
        let mut matches = self.matches.write().map_err(|_| poisoned())?;
        let stored = matches
            .get_mut(&m.id)
            .ok_or_else(|| ApiError::not_found(format!("Match {} not found", m.id)))?;

        stored.team1.score = m.team1.score;
        stored.team2.score = m.team2.score;
        stored.status = m.status;
        stored.end_date = m.end_date;
        stored.goals.push(goal.clone());
        Ok(())
    }

    async fn save_match_with_goals(&self, m: &Match) -> Result<Match, ApiError> {
        self.check_online()?;
        let mut matches = self.matches.write().map_err(|_| poisoned())?;

        if !matches.contains_key(&m.id) {
            let mut order = self.match_order.write().map_err(|_| poisoned())?;
            order.push(m.id.clone());
        }
        matches.insert(m.id.clone(), m.clone());
        Ok(m.clone())
    }

    async fn ping(&self) -> Result<(), ApiError> {
        self.check_online()
    }
}
