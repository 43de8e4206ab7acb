//! Scoring rules: turn scoring events into score deltas and decide when a match is over.
//!
//! These functions only mutate the in-memory aggregate; persistence and
//! notifications are handled by [`crate::service::MatchService`].

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::api_error::ApiError;
use crate::models::{
    BetResult, CookieOutcome, Goal, GoalTarget, GoalType, Match, MatchStatus, TeamSide,
    MAX_CUSTOM_POINTS, WIN_SCORE,
};

/// Resolve the signed delta of a goal type and the side it applies to,
/// relative to the scorer's team.
pub fn resolve_points(
    goal_type: GoalType,
    custom_points: Option<i32>,
) -> Result<(GoalTarget, i32), ApiError> {
    let rule = goal_type.rule();

    let base = if rule.custom_points {
        match custom_points {
            Some(points) if (1..=MAX_CUSTOM_POINTS).contains(&points) => points,
            Some(points) => {
                return Err(ApiError::InvalidGoalConfig(format!(
                    "{} points must be between 1 and {}, got {}",
                    goal_type.as_str(),
                    MAX_CUSTOM_POINTS,
                    points
                )))
            }
            None => {
                return Err(ApiError::InvalidGoalConfig(format!(
                    "{} requires an explicit point value",
                    goal_type.as_str()
                )))
            }
        }
    } else {
        rule.base_points
    };

    Ok((rule.target, base * rule.multiplier))
}

fn ensure_in_progress(m: &Match) -> Result<(), ApiError> {
    if m.status != MatchStatus::InProgress {
        return Err(ApiError::conflict(format!(
            "Scores can only change while the match is en cours (currently {})",
            m.status
        )));
    }
    Ok(())
}

/// Finish the match if a team reached the winning score. Returns true on transition.
pub fn finalize_if_won(m: &mut Match) -> Result<bool, ApiError> {
    if m.status == MatchStatus::InProgress && m.has_winning_score() {
        m.finalize()?;
        return Ok(true);
    }
    Ok(false)
}

/// Apply a scoring event to the match and append it to the goal log.
///
/// Event-driven scores are not clamped and may go below zero.
pub fn record_goal(
    m: &mut Match,
    team: TeamSide,
    goal_type: GoalType,
    player_id: &str,
    custom_points: Option<i32>,
) -> Result<Goal, ApiError> {
    ensure_in_progress(m)?;

    if !m.team(team).has_player(player_id) {
        return Err(ApiError::bad_request(format!(
            "Player {} is not on {}",
            player_id, team
        )));
    }

    let (target, delta) = resolve_points(goal_type, custom_points)?;
    let target_side = match target {
        GoalTarget::Scorer => team,
        GoalTarget::Opponent => team.opponent(),
    };
    let side = m.team_mut(target_side);
    side.score = side.score.checked_add(delta).ok_or_else(|| {
        ApiError::InvalidGoalConfig(format!(
            "{} of {} points overflows the {} score",
            goal_type.as_str(),
            delta,
            target_side
        ))
    })?;

    let goal = Goal {
        id: Uuid::new_v4().to_string(),
        team,
        player_id: player_id.to_string(),
        goal_type,
        points: delta,
        timestamp: Utc::now(),
    };
    m.goals.push(goal.clone());

    debug!(
        match_id = %m.id,
        goal_type = goal_type.as_str(),
        target = %target_side,
        delta,
        "Applied scoring event"
    );

    finalize_if_won(m)?;
    Ok(goal)
}

/// Manual score correction by one point. Clamped at zero, never logged as a goal.
pub fn adjust_score(m: &mut Match, team: TeamSide, delta: i32) -> Result<(), ApiError> {
    if delta != 1 && delta != -1 {
        return Err(ApiError::bad_request(format!(
            "Score adjustments are +1 or -1, got {}",
            delta
        )));
    }
    ensure_in_progress(m)?;

    let side = m.team_mut(team);
    side.score = side
        .score
        .checked_add(delta)
        .ok_or_else(|| ApiError::bad_request(format!("{} score is out of range", team)))?
        .max(0);

    finalize_if_won(m)?;
    Ok(())
}

/// Cookie (shutout) outcome of a finished match, `None` if it was not one.
pub fn cookie_outcome(m: &Match) -> Option<CookieOutcome> {
    if m.status != MatchStatus::Finished {
        return None;
    }

    let winner = m.winner()?;
    let winner_score = m.team(winner).score;
    let loser_score = m.team(winner.opponent()).score;
    if winner_score < WIN_SCORE || loser_score > 0 {
        return None;
    }

    let referee_bet = m.referee.as_ref().map(|_| match m.bet {
        Some(bet) if bet == winner => BetResult::Won,
        Some(_) => BetResult::Lost,
        None => BetResult::NoBet,
    });

    Some(CookieOutcome {
        winner,
        winner_score,
        loser_score,
        referee_bet,
    })
}
