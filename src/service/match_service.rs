use std::sync::Arc;

use rand::Rng;
use tracing::{info, warn};
use validator::Validate;

use crate::api_error::ApiError;
use crate::models::*;
use crate::service::notification_service::MatchNotifier;
use crate::service::scoring;
use crate::service::team_generator::generate_balanced_teams;
use crate::session::SessionContext;
use crate::store::{degrade_listing, LeagueStore};

/// Match lifecycle and live scoring on top of the league store.
///
/// Every mutation loads the match, applies the change to the aggregate and
/// writes it back once. Transitions to `terminé` are handed to the notifier.
pub struct MatchService<S> {
    store: Arc<S>,
    notifier: Arc<dyn MatchNotifier>,
    balance_filter: StatsFilter,
}

impl<S: LeagueStore> MatchService<S> {
    pub fn new(store: Arc<S>, notifier: Arc<dyn MatchNotifier>, balance_filter: StatsFilter) -> Self {
        Self {
            store,
            notifier,
            balance_filter,
        }
    }

    // =============================================================================
    // READS
    // =============================================================================

    pub async fn list_matches(&self, filter: &MatchFilter) -> Result<Vec<Match>, ApiError> {
        degrade_listing(self.store.get_matches(filter).await, "matches")
    }

    pub async fn get_match(&self, id: &str) -> Result<Match, ApiError> {
        self.store
            .get_match_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Match {} not found", id)))
    }

    /// Shutout details for a finished match, `None` when it was not a cookie.
    pub async fn cookie(&self, id: &str) -> Result<Option<CookieOutcome>, ApiError> {
        let m = self.get_match(id).await?;
        Ok(scoring::cookie_outcome(&m))
    }

    // =============================================================================
    // CREATE
    // =============================================================================

    async fn resolve_player(&self, id: &str) -> Result<Player, ApiError> {
        self.store
            .get_player_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Player {} not found", id)))
    }

    pub async fn create_match(&self, request: CreateMatchRequest) -> Result<Match, ApiError> {
        validate_rosters(
            [request.team1[0].as_str(), request.team1[1].as_str()],
            [request.team2[0].as_str(), request.team2[1].as_str()],
            request.referee_id.as_deref(),
        )?;

        let team1 = [
            self.resolve_player(&request.team1[0]).await?,
            self.resolve_player(&request.team1[1]).await?,
        ];
        let team2 = [
            self.resolve_player(&request.team2[0]).await?,
            self.resolve_player(&request.team2[1]).await?,
        ];
        let referee = match request.referee_id.as_deref() {
            Some(id) => Some(self.resolve_player(id).await?),
            None => None,
        };

        let mut m = Match::new(request.match_type, team1, team2, referee)?;
        if request.start_immediately {
            m.start()?;
        }
        self.store.save_match(&m).await?;

        info!(
            match_id = %m.id,
            match_type = %m.match_type,
            status = %m.status,
            referee = m.referee.is_some(),
            "Match created"
        );
        Ok(m)
    }

    /// Create an `officiel` match from the least-played players.
    pub async fn create_balanced_match(&self) -> Result<Match, ApiError> {
        let (players, history) = self.balance_inputs().await?;
        let teams = {
            let mut rng = rand::thread_rng();
            generate_balanced_teams(&players, &history, self.balance_filter, &mut rng)?
        };
        self.save_balanced(teams).await
    }

    /// Same as [`Self::create_balanced_match`] with a caller-provided random source.
    pub async fn create_balanced_match_with<R: Rng>(&self, rng: &mut R) -> Result<Match, ApiError> {
        let (players, history) = self.balance_inputs().await?;
        let teams = generate_balanced_teams(&players, &history, self.balance_filter, rng)?;
        self.save_balanced(teams).await
    }

    async fn balance_inputs(&self) -> Result<(Vec<Player>, Vec<Match>), ApiError> {
        let players = self.store.get_players(&PlayerFilter::default()).await?;
        let history = self.store.get_matches(&MatchFilter::finished()).await?;
        Ok((players, history))
    }

    async fn save_balanced(&self, teams: BalancedTeams) -> Result<Match, ApiError> {
        let BalancedTeams {
            team1,
            team2,
            referee,
        } = teams;
        let m = Match::new(MatchType::Official, team1.players, team2.players, referee)?;
        self.store.save_match(&m).await?;

        info!(
            match_id = %m.id,
            team1 = ?m.team1.player_ids(),
            team2 = ?m.team2.player_ids(),
            "Balanced match created"
        );
        Ok(m)
    }

    // =============================================================================
    // LIFECYCLE
    // =============================================================================

    pub async fn start_match(&self, id: &str) -> Result<Match, ApiError> {
        let mut m = self.get_match(id).await?;
        m.start()?;
        self.store.save_match(&m).await?;
        info!(match_id = %m.id, "Match started");
        Ok(m)
    }

    pub async fn cancel_match(&self, id: &str) -> Result<Match, ApiError> {
        let mut m = self.get_match(id).await?;
        m.cancel()?;
        self.store.save_match(&m).await?;
        info!(match_id = %m.id, "Match cancelled");
        Ok(m)
    }

    pub async fn finalize_match(&self, id: &str) -> Result<Match, ApiError> {
        let mut m = self.get_match(id).await?;
        m.finalize()?;
        self.store.save_match(&m).await?;
        self.announce_finished(&m);
        Ok(m)
    }

    /// Record the referee's prediction before kick-off. `None` withdraws it.
    pub async fn place_bet(
        &self,
        session: &SessionContext,
        id: &str,
        bet: Option<TeamSide>,
    ) -> Result<Match, ApiError> {
        let actor = session.require_player()?;
        let mut m = self.get_match(id).await?;
        if bet.is_some() && m.referee.is_none() {
            return Err(ApiError::bad_request("Only matches with a referee take bets"));
        }
        m.place_bet(bet)?;
        self.store.save_match(&m).await?;

        info!(match_id = %m.id, actor = %actor, bet = ?bet, "Bet placed");
        Ok(m)
    }

    /// Merge a partial update into the stored match.
    ///
    /// A `goals` field overwrites the whole stored goal log; prefer
    /// [`Self::record_goal`] while a match is being scored.
    pub async fn update_match(&self, id: &str, update: MatchUpdate) -> Result<Match, ApiError> {
        let mut m = self.get_match(id).await?;
        let was_finished = m.status == MatchStatus::Finished;

        let goals_replaced = m.apply_update(update)?;
        let m = if goals_replaced {
            warn!(
                match_id = %m.id,
                goals = m.goals.len(),
                "Overwriting stored goal log from a match update"
            );
            self.store.save_match_with_goals(&m).await?
        } else {
            self.store.save_match(&m).await?
        };

        info!(match_id = %m.id, status = %m.status, "Match updated");
        if !was_finished && m.status == MatchStatus::Finished {
            self.announce_finished(&m);
        }
        Ok(m)
    }

    // =============================================================================
    // SCORING
    // =============================================================================

    /// Apply one scoring event and persist it with the scores it produced.
    pub async fn record_goal(&self, id: &str, request: RecordGoalRequest) -> Result<Match, ApiError> {
        request.validate()?;

        let mut m = self.get_match(id).await?;
        let goal = scoring::record_goal(
            &mut m,
            request.team,
            request.goal_type,
            &request.player_id,
            request.custom_points,
        )?;
        self.store.append_goal(&m, &goal).await?;

        info!(
            match_id = %m.id,
            goal_id = %goal.id,
            goal_type = goal.goal_type.as_str(),
            team = %goal.team,
            points = goal.points,
            score = %format!("{}-{}", m.team1.score, m.team2.score),
            "Goal recorded"
        );
        if m.status == MatchStatus::Finished {
            self.announce_finished(&m);
        }
        Ok(m)
    }

    pub async fn adjust_score(&self, id: &str, request: AdjustScoreRequest) -> Result<Match, ApiError> {
        let mut m = self.get_match(id).await?;
        scoring::adjust_score(&mut m, request.team, request.delta)?;
        self.store.save_match(&m).await?;

        info!(
            match_id = %m.id,
            team = %request.team,
            delta = request.delta,
            "Score adjusted"
        );
        if m.status == MatchStatus::Finished {
            self.announce_finished(&m);
        }
        Ok(m)
    }

    fn announce_finished(&self, m: &Match) {
        info!(
            match_id = %m.id,
            team1_score = m.team1.score,
            team2_score = m.team2.score,
            winner = ?m.winner(),
            "Match finished"
        );
        self.notifier.match_finished(m);
    }
}
