use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::api_error::ApiError;
use crate::models::player::Player;

/// Score at which a match is over.
pub const WIN_SCORE: i32 = 10;

/// Largest value a demi may be worth. Kept equal to the literal bound on
/// [`RecordGoalRequest::custom_points`].
pub const MAX_CUSTOM_POINTS: i32 = WIN_SCORE;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MatchType {
    /// Ranked match, wins are worth league points.
    #[serde(rename = "officiel")]
    Official,
    /// Practice match, counted in stats but never in points.
    #[serde(rename = "entraînement")]
    Training,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Official => "officiel",
            MatchType::Training => "entraînement",
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MatchType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "officiel" => Ok(MatchType::Official),
            "entraînement" => Ok(MatchType::Training),
            other => Err(ApiError::bad_request(format!("Unknown match type: {}", other))),
        }
    }
}

/// Match lifecycle state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MatchStatus {
    #[serde(rename = "en attente")]
    Pending,
    #[serde(rename = "en cours")]
    InProgress,
    #[serde(rename = "terminé")]
    Finished,
    #[serde(rename = "annulé")]
    Cancelled,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "en attente",
            MatchStatus::InProgress => "en cours",
            MatchStatus::Finished => "terminé",
            MatchStatus::Cancelled => "annulé",
        }
    }

    /// Check if transition to another state is valid
    pub fn can_transition_to(&self, to: &MatchStatus) -> bool {
        match (self, to) {
            (MatchStatus::Pending, MatchStatus::InProgress) => true,
            (MatchStatus::Pending, MatchStatus::Finished) => true,
            (MatchStatus::Pending, MatchStatus::Cancelled) => true,
            (MatchStatus::InProgress, MatchStatus::Finished) => true,
            (MatchStatus::InProgress, MatchStatus::Cancelled) => true,
            _ => false,
        }
    }

    /// Get all valid next states from current state
    pub fn valid_next_states(&self) -> Vec<MatchStatus> {
        match self {
            MatchStatus::Pending => vec![
                MatchStatus::InProgress,
                MatchStatus::Finished,
                MatchStatus::Cancelled,
            ],
            MatchStatus::InProgress => vec![MatchStatus::Finished, MatchStatus::Cancelled],
            MatchStatus::Finished | MatchStatus::Cancelled => vec![],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Finished | MatchStatus::Cancelled)
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en attente" => Ok(MatchStatus::Pending),
            "en cours" => Ok(MatchStatus::InProgress),
            "terminé" => Ok(MatchStatus::Finished),
            "annulé" => Ok(MatchStatus::Cancelled),
            other => Err(ApiError::bad_request(format!("Unknown match status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    Team1,
    Team2,
}

impl TeamSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamSide::Team1 => "team1",
            TeamSide::Team2 => "team2",
        }
    }

    pub fn opponent(&self) -> TeamSide {
        match self {
            TeamSide::Team1 => TeamSide::Team2,
            TeamSide::Team2 => TeamSide::Team1,
        }
    }
}

impl std::fmt::Display for TeamSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TeamSide {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "team1" => Ok(TeamSide::Team1),
            "team2" => Ok(TeamSide::Team2),
            other => Err(ApiError::bad_request(format!("Unknown team: {}", other))),
        }
    }
}

/// Which side a scoring event lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalTarget {
    Scorer,
    Opponent,
}

/// Static scoring rule for a goal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalRule {
    pub base_points: i32,
    pub multiplier: i32,
    pub target: GoalTarget,
    /// Points are chosen by the operator instead of `base_points`.
    pub custom_points: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    Normal,
    Demi,
    Gardien,
    Gamelle,
    Pissette,
}

impl GoalType {
    pub const ALL: [GoalType; 5] = [
        GoalType::Normal,
        GoalType::Demi,
        GoalType::Gardien,
        GoalType::Gamelle,
        GoalType::Pissette,
    ];

    pub const fn rule(&self) -> GoalRule {
        match self {
            GoalType::Normal => GoalRule {
                base_points: 1,
                multiplier: 1,
                target: GoalTarget::Scorer,
                custom_points: false,
            },
            GoalType::Demi => GoalRule {
                base_points: 2,
                multiplier: 1,
                target: GoalTarget::Scorer,
                custom_points: true,
            },
            GoalType::Gardien => GoalRule {
                base_points: 1,
                multiplier: 2,
                target: GoalTarget::Scorer,
                custom_points: false,
            },
            GoalType::Gamelle => GoalRule {
                base_points: -1,
                multiplier: 1,
                target: GoalTarget::Opponent,
                custom_points: false,
            },
            GoalType::Pissette => GoalRule {
                base_points: -1,
                multiplier: 1,
                target: GoalTarget::Scorer,
                custom_points: false,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::Normal => "normal",
            GoalType::Demi => "demi",
            GoalType::Gardien => "gardien",
            GoalType::Gamelle => "gamelle",
            GoalType::Pissette => "pissette",
        }
    }
}

impl FromStr for GoalType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GoalType::ALL
            .into_iter()
            .find(|goal_type| goal_type.as_str() == s)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown goal type: {}", s)))
    }
}

/// A recorded scoring event. `points` is the signed delta that was applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub team: TeamSide,
    pub player_id: String,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub points: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub players: [Player; 2],
    pub score: i32,
}

impl Team {
    pub fn new(players: [Player; 2]) -> Self {
        Self { players, score: 0 }
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    pub fn player_ids(&self) -> [&str; 2] {
        [self.players[0].id.as_str(), self.players[1].id.as_str()]
    }

    pub fn names(&self, separator: &str) -> String {
        self.players
            .iter()
            .map(|p| p.name.as_str())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Check roster shape: two distinct players per team, no shared player, referee not playing.
pub fn validate_rosters(
    team1: [&str; 2],
    team2: [&str; 2],
    referee: Option<&str>,
) -> Result<(), ApiError> {
    if team1.iter().chain(team2.iter()).any(|id| id.trim().is_empty()) {
        return Err(ApiError::bad_request("Player ids must not be empty"));
    }
    if team1[0] == team1[1] || team2[0] == team2[1] {
        return Err(ApiError::bad_request(
            "Each team needs two distinct players",
        ));
    }

    let team1_ids: HashSet<&str> = team1.into_iter().collect();
    if team2.iter().any(|id| team1_ids.contains(id)) {
        return Err(ApiError::bad_request(
            "A player cannot be on both teams",
        ));
    }

    if let Some(referee) = referee {
        if team1.contains(&referee) || team2.contains(&referee) {
            return Err(ApiError::bad_request(
                "The referee cannot play in the match",
            ));
        }
    }

    Ok(())
}

/// A foosball match between two teams of two.
///
/// `end_date`, `referee` and `bet` are null until set: a match without referee
/// has no bet, and `end_date` is only written when the match finishes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    #[serde(rename = "type")]
    pub match_type: MatchType,
    pub status: MatchStatus,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    pub team1: Team,
    pub team2: Team,
    #[serde(default)]
    pub referee: Option<Player>,
    #[serde(default)]
    pub bet: Option<TeamSide>,
    #[serde(default)]
    pub goals: Vec<Goal>,
}

impl Match {
    /// New match awaiting its start, scores at zero and no goals.
    pub fn new(
        match_type: MatchType,
        team1: [Player; 2],
        team2: [Player; 2],
        referee: Option<Player>,
    ) -> Result<Self, ApiError> {
        validate_rosters(
            [team1[0].id.as_str(), team1[1].id.as_str()],
            [team2[0].id.as_str(), team2[1].id.as_str()],
            referee.as_ref().map(|r| r.id.as_str()),
        )?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            match_type,
            status: MatchStatus::Pending,
            start_date: Utc::now(),
            end_date: None,
            team1: Team::new(team1),
            team2: Team::new(team2),
            referee,
            bet: None,
            goals: Vec::new(),
        })
    }

    pub fn team(&self, side: TeamSide) -> &Team {
        match side {
            TeamSide::Team1 => &self.team1,
            TeamSide::Team2 => &self.team2,
        }
    }

    pub fn team_mut(&mut self, side: TeamSide) -> &mut Team {
        match side {
            TeamSide::Team1 => &mut self.team1,
            TeamSide::Team2 => &mut self.team2,
        }
    }

    pub fn side_of(&self, player_id: &str) -> Option<TeamSide> {
        if self.team1.has_player(player_id) {
            Some(TeamSide::Team1)
        } else if self.team2.has_player(player_id) {
            Some(TeamSide::Team2)
        } else {
            None
        }
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.side_of(player_id).is_some()
    }

    /// Team with the strictly greater score, `None` on a tie.
    pub fn winner(&self) -> Option<TeamSide> {
        use std::cmp::Ordering;

        match self.team1.score.cmp(&self.team2.score) {
            Ordering::Greater => Some(TeamSide::Team1),
            Ordering::Less => Some(TeamSide::Team2),
            Ordering::Equal => None,
        }
    }

    pub fn has_winning_score(&self) -> bool {
        self.team1.score >= WIN_SCORE || self.team2.score >= WIN_SCORE
    }

    pub fn validate_transition(&self, to: MatchStatus) -> Result<(), ApiError> {
        if self.status.is_terminal() {
            return Err(ApiError::conflict(format!(
                "Match is already {}, cannot move to {}",
                self.status, to
            )));
        }
        if !self.status.can_transition_to(&to) {
            let allowed: Vec<&str> = self
                .status
                .valid_next_states()
                .iter()
                .map(|s| s.as_str())
                .collect();
            return Err(ApiError::conflict(format!(
                "Invalid state transition from {} to {} (allowed: {})",
                self.status,
                to,
                allowed.join(", ")
            )));
        }
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), ApiError> {
        self.validate_transition(MatchStatus::InProgress)?;
        self.status = MatchStatus::InProgress;
        self.start_date = Utc::now();
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), ApiError> {
        self.validate_transition(MatchStatus::Cancelled)?;
        self.status = MatchStatus::Cancelled;
        Ok(())
    }

    /// Mark the match finished and stamp `end_date`.
    pub fn finalize(&mut self) -> Result<(), ApiError> {
        self.validate_transition(MatchStatus::Finished)?;
        self.status = MatchStatus::Finished;
        self.end_date = Some(Utc::now());
        Ok(())
    }

    /// Store the referee's prediction. Only allowed before kick-off.
    pub fn place_bet(&mut self, bet: Option<TeamSide>) -> Result<(), ApiError> {
        if self.status != MatchStatus::Pending {
            return Err(ApiError::conflict(format!(
                "Bets are closed once the match is {}",
                self.status
            )));
        }
        self.bet = bet;
        Ok(())
    }

    /// Merge a partial update. Absent fields keep their value; `goals`, when
    /// present, replaces the whole goal list. Returns true when goals were replaced.
    ///
    /// Bets and status changes go through [`Match::place_bet`] and the lifecycle
    /// methods, so they follow the same rules as the dedicated endpoints.
    pub fn apply_update(&mut self, update: MatchUpdate) -> Result<bool, ApiError> {
        let has_referee = {
            let team1 = update.team1.as_ref().unwrap_or(&self.team1);
            let team2 = update.team2.as_ref().unwrap_or(&self.team2);
            let referee = update.referee.as_ref().or(self.referee.as_ref());
            validate_rosters(
                team1.player_ids(),
                team2.player_ids(),
                referee.map(|r| r.id.as_str()),
            )?;
            referee.is_some()
        };

        // The bet is checked against the status before this update moves it.
        if let Some(bet) = update.bet {
            if self.bet != Some(bet) {
                if !has_referee {
                    return Err(ApiError::bad_request("A bet needs a referee to place it"));
                }
                self.place_bet(Some(bet))?;
            }
        }

        if let Some(status) = update.status {
            if status != self.status {
                match status {
                    MatchStatus::InProgress => self.start()?,
                    MatchStatus::Finished => self.finalize()?,
                    MatchStatus::Cancelled => self.cancel()?,
                    MatchStatus::Pending => self.validate_transition(status)?,
                }
            }
        }
        if let Some(match_type) = update.match_type {
            self.match_type = match_type;
        }
        if let Some(start_date) = update.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = update.end_date {
            self.end_date = Some(end_date);
        }
        if let Some(team1) = update.team1 {
            self.team1 = team1;
        }
        if let Some(team2) = update.team2 {
            self.team2 = team2;
        }
        if let Some(referee) = update.referee {
            self.referee = Some(referee);
        }

        match update.goals {
            Some(goals) => {
                self.goals = goals;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Partial match update. `None` (absent or null) never clears a stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchUpdate {
    #[serde(rename = "type", default)]
    pub match_type: Option<MatchType>,
    #[serde(default)]
    pub status: Option<MatchStatus>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub team1: Option<Team>,
    #[serde(default)]
    pub team2: Option<Team>,
    #[serde(default)]
    pub referee: Option<Player>,
    #[serde(default)]
    pub bet: Option<TeamSide>,
    /// Replaces every stored goal. Concurrent scorers can lose events through this.
    #[serde(default)]
    pub goals: Option<Vec<Goal>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchFilter {
    pub status: Option<MatchStatus>,
    pub match_type: Option<MatchType>,
    pub player_id: Option<String>,
}

impl MatchFilter {
    pub fn finished() -> Self {
        Self {
            status: Some(MatchStatus::Finished),
            ..Self::default()
        }
    }

    pub fn matches(&self, m: &Match) -> bool {
        self.status.map_or(true, |status| m.status == status)
            && self.match_type.map_or(true, |t| m.match_type == t)
            && self
                .player_id
                .as_deref()
                .map_or(true, |player_id| m.has_player(player_id))
    }
}

// ===== API DTOs =====

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    #[serde(rename = "type")]
    pub match_type: MatchType,
    pub team1: [String; 2],
    pub team2: [String; 2],
    #[serde(default)]
    pub referee_id: Option<String>,
    /// Skip the betting phase and create the match `en cours`.
    #[serde(default)]
    pub start_immediately: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordGoalRequest {
    pub team: TeamSide,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    #[validate(length(min = 1))]
    pub player_id: String,
    #[validate(range(min = 1, max = 10))]
    #[serde(default)]
    pub custom_points: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AdjustScoreRequest {
    pub team: TeamSide,
    pub delta: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PlaceBetRequest {
    #[serde(default)]
    pub bet: Option<TeamSide>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BetResult {
    Won,
    Lost,
    NoBet,
}

/// Shutout outcome of a finished match: winner reached the target, loser has nothing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CookieOutcome {
    pub winner: TeamSide,
    pub winner_score: i32,
    pub loser_score: i32,
    /// `None` when the match had no referee.
    pub referee_bet: Option<BetResult>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_valid_state_transitions() {
        let pending = MatchStatus::Pending;
        let in_progress = MatchStatus::InProgress;
        let finished = MatchStatus::Finished;
        let cancelled = MatchStatus::Cancelled;

        assert!(pending.can_transition_to(&in_progress));
        assert!(pending.can_transition_to(&cancelled));
        assert!(in_progress.can_transition_to(&finished));
        assert!(in_progress.can_transition_to(&cancelled));

        assert!(!in_progress.can_transition_to(&pending));
        assert!(!in_progress.can_transition_to(&in_progress));
        assert!(!finished.can_transition_to(&cancelled));
        assert!(!cancelled.can_transition_to(&in_progress));
    }

    #[test]
    fn test_terminal_state() {
        assert!(!MatchStatus::Pending.is_terminal());
        assert!(!MatchStatus::InProgress.is_terminal());
        assert!(MatchStatus::Finished.is_terminal());
        assert!(MatchStatus::Cancelled.is_terminal());
        assert_eq!(MatchStatus::Finished.valid_next_states(), vec![]);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&MatchStatus::Finished).unwrap();
        assert_eq!(json, "\"terminé\"");
        let status: MatchStatus = serde_json::from_str("\"en attente\"").unwrap();
        assert_eq!(status, MatchStatus::Pending);
        assert_eq!(
            serde_json::to_string(&MatchType::Training).unwrap(),
            "\"entraînement\""
        );
        assert_eq!("annulé".parse::<MatchStatus>().unwrap(), MatchStatus::Cancelled);
    }

    #[test]
    fn test_new_match_defaults() {
        let m = new_match(MatchType::Official);
        assert_eq!(m.status, MatchStatus::Pending);
        assert_eq!(m.team1.score, 0);
        assert_eq!(m.team2.score, 0);
        assert!(m.goals.is_empty());
        assert!(m.bet.is_none());
        assert!(m.end_date.is_none());
    }

    #[test]
    fn test_new_match_rejects_shared_player() {
        let result = Match::new(
            MatchType::Official,
            [player("a"), player("b")],
            [player("b"), player("c")],
            None,
        );
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
    }

    #[test]
    fn test_new_match_rejects_duplicate_teammate() {
        let result = Match::new(
            MatchType::Training,
            [player("a"), player("a")],
            [player("c"), player("d")],
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_new_match_rejects_playing_referee() {
        let result = Match::new(
            MatchType::Official,
            [player("a"), player("b")],
            [player("c"), player("d")],
            Some(player("d")),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_start_requires_pending() {
        let mut m = new_match(MatchType::Official);
        assert!(m.start().is_ok());
        assert_eq!(m.status, MatchStatus::InProgress);
        assert!(matches!(m.start(), Err(ApiError::Conflict(_))));
    }

    #[test]
    fn test_cancel_rules() {
        let mut m = new_match(MatchType::Official);
        m.start().unwrap();
        assert!(m.cancel().is_ok());
        assert_eq!(m.status, MatchStatus::Cancelled);

        let mut finished = finished_match(MatchType::Official, 10, 3);
        assert!(matches!(finished.cancel(), Err(ApiError::Conflict(_))));
    }

    #[test]
    fn test_finalize_sets_end_date() {
        let m = finished_match(MatchType::Official, 10, 3);
        assert_eq!(m.status, MatchStatus::Finished);
        assert!(m.end_date.is_some());
    }

    #[test]
    fn test_bet_only_while_pending() {
        let mut m = new_match(MatchType::Official);
        assert!(m.place_bet(Some(TeamSide::Team2)).is_ok());
        assert_eq!(m.bet, Some(TeamSide::Team2));
        assert!(m.place_bet(None).is_ok());
        assert_eq!(m.bet, None);

        m.start().unwrap();
        assert!(matches!(
            m.place_bet(Some(TeamSide::Team1)),
            Err(ApiError::Conflict(_))
        ));
    }

    #[test]
    fn test_winner_is_strict() {
        let m = finished_match(MatchType::Official, 8, 8);
        assert_eq!(m.winner(), None);
        let m = finished_match(MatchType::Official, 3, 10);
        assert_eq!(m.winner(), Some(TeamSide::Team2));
    }

    #[test]
    fn test_update_keeps_absent_fields() {
        let mut m = new_match(MatchType::Official);
        m.place_bet(Some(TeamSide::Team1)).unwrap();
        let replaced = m
            .apply_update(MatchUpdate {
                match_type: Some(MatchType::Training),
                ..MatchUpdate::default()
            })
            .unwrap();

        assert!(!replaced);
        assert_eq!(m.match_type, MatchType::Training);
        assert_eq!(m.bet, Some(TeamSide::Team1));
        assert_eq!(m.team1.player_ids(), ["a", "b"]);
    }

    #[test]
    fn test_update_replaces_goals() {
        let mut m = new_match(MatchType::Official);
        m.goals.push(Goal {
            id: "g1".to_string(),
            team: TeamSide::Team1,
            player_id: "a".to_string(),
            goal_type: GoalType::Normal,
            points: 1,
            timestamp: Utc::now(),
        });

        let replaced = m
            .apply_update(MatchUpdate {
                goals: Some(vec![]),
                ..MatchUpdate::default()
            })
            .unwrap();

        assert!(replaced);
        assert!(m.goals.is_empty());
    }

    #[test]
    fn test_update_rejects_overlapping_teams() {
        let mut m = new_match(MatchType::Official);
        let result = m.apply_update(MatchUpdate {
            team2: Some(Team::new([player("a"), player("e")])),
            ..MatchUpdate::default()
        });
        assert!(result.is_err());
        assert_eq!(m.team2.player_ids(), ["c", "d"]);
    }

    #[test]
    fn test_update_enforces_lifecycle() {
        let mut m = finished_match(MatchType::Official, 10, 0);
        let result = m.apply_update(MatchUpdate {
            status: Some(MatchStatus::InProgress),
            ..MatchUpdate::default()
        });
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }

    #[test]
    fn test_update_cannot_bet_after_kickoff() {
        let mut m = Match::new(
            MatchType::Official,
            [player("a"), player("b")],
            [player("c"), player("d")],
            Some(player("e")),
        )
        .unwrap();
        m.place_bet(Some(TeamSide::Team1)).unwrap();
        m.start().unwrap();

        let result = m.apply_update(MatchUpdate {
            bet: Some(TeamSide::Team2),
            ..MatchUpdate::default()
        });
        assert!(matches!(result, Err(ApiError::Conflict(_))));
        assert_eq!(m.bet, Some(TeamSide::Team1));

        // Restating the current bet is not a change.
        m.apply_update(MatchUpdate {
            bet: Some(TeamSide::Team1),
            ..MatchUpdate::default()
        })
        .unwrap();
    }

    #[test]
    fn test_update_bet_before_kickoff() {
        let mut m = new_match(MatchType::Official);
        let result = m.apply_update(MatchUpdate {
            bet: Some(TeamSide::Team2),
            ..MatchUpdate::default()
        });
        assert!(matches!(result, Err(ApiError::ValidationError(_))));
        assert_eq!(m.bet, None);

        m.apply_update(MatchUpdate {
            referee: Some(player("e")),
            bet: Some(TeamSide::Team2),
            status: Some(MatchStatus::InProgress),
            ..MatchUpdate::default()
        })
        .unwrap();
        assert_eq!(m.bet, Some(TeamSide::Team2));
        assert_eq!(m.status, MatchStatus::InProgress);
    }

    #[test]
    fn test_update_start_stamps_start_date() {
        let mut m = new_match(MatchType::Official);
        let scheduled = Utc::now() - chrono::Duration::days(2);
        m.start_date = scheduled;

        m.apply_update(MatchUpdate {
            status: Some(MatchStatus::InProgress),
            ..MatchUpdate::default()
        })
        .unwrap();
        assert_eq!(m.status, MatchStatus::InProgress);
        assert!(m.start_date > scheduled);

        let kickoff = Utc::now() - chrono::Duration::minutes(5);
        let mut m = new_match(MatchType::Official);
        m.apply_update(MatchUpdate {
            status: Some(MatchStatus::InProgress),
            start_date: Some(kickoff),
            ..MatchUpdate::default()
        })
        .unwrap();
        assert_eq!(m.start_date, kickoff);
    }

    #[test]
    fn test_update_finish_and_cancel() {
        let mut m = new_match(MatchType::Official);
        m.apply_update(MatchUpdate {
            status: Some(MatchStatus::Finished),
            ..MatchUpdate::default()
        })
        .unwrap();
        assert!(m.end_date.is_some());

        let mut m = new_match(MatchType::Official);
        m.apply_update(MatchUpdate {
            status: Some(MatchStatus::Cancelled),
            ..MatchUpdate::default()
        })
        .unwrap();
        assert_eq!(m.status, MatchStatus::Cancelled);
        assert!(m.end_date.is_none());
    }

    #[test]
    fn test_match_filter() {
        let m = finished_match(MatchType::Training, 10, 2);
        assert!(MatchFilter::finished().matches(&m));
        assert!(!MatchFilter {
            match_type: Some(MatchType::Official),
            ..MatchFilter::default()
        }
        .matches(&m));
        assert!(MatchFilter {
            player_id: Some("c".to_string()),
            ..MatchFilter::default()
        }
        .matches(&m));
        assert!(!MatchFilter {
            player_id: Some("z".to_string()),
            ..MatchFilter::default()
        }
        .matches(&m));
    }

    #[test]
    fn test_create_match_request_deserialization() {
        let json = r#"{"type":"officiel","team1":["a","b"],"team2":["c","d"],"refereeId":"e"}"#;
        let req: CreateMatchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.match_type, MatchType::Official);
        assert_eq!(req.referee_id.as_deref(), Some("e"));
        assert!(!req.start_immediately);
    }

    #[test]
    fn test_record_goal_request_validation() {
        let req: RecordGoalRequest = serde_json::from_str(
            r#"{"team":"team1","type":"demi","playerId":"a","customPoints":0}"#,
        )
        .unwrap();
        assert_eq!(req.goal_type, GoalType::Demi);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_record_goal_request_caps_custom_points() {
        let at_cap: RecordGoalRequest = serde_json::from_str(&format!(
            r#"{{"team":"team1","type":"demi","playerId":"a","customPoints":{}}}"#,
            MAX_CUSTOM_POINTS
        ))
        .unwrap();
        assert!(at_cap.validate().is_ok());

        let huge: RecordGoalRequest = serde_json::from_str(&format!(
            r#"{{"team":"team1","type":"demi","playerId":"a","customPoints":{}}}"#,
            i32::MAX
        ))
        .unwrap();
        assert!(huge.validate().is_err());
    }
}
