use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api_error::ApiError;
use crate::models::match_model::{Match, MatchType, Team};
use crate::models::player::Player;

/// Which matches a statistics query folds over.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum StatsFilter {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "officiel")]
    Official,
    #[serde(rename = "entraînement")]
    Training,
}

impl StatsFilter {
    pub fn includes(&self, match_type: MatchType) -> bool {
        match self {
            StatsFilter::All => true,
            StatsFilter::Official => match_type == MatchType::Official,
            StatsFilter::Training => match_type == MatchType::Training,
        }
    }

    pub fn match_type(&self) -> Option<MatchType> {
        match self {
            StatsFilter::All => None,
            StatsFilter::Official => Some(MatchType::Official),
            StatsFilter::Training => Some(MatchType::Training),
        }
    }
}

impl FromStr for StatsFilter {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatsFilter::All),
            "officiel" => Ok(StatsFilter::Official),
            "entraînement" => Ok(StatsFilter::Training),
            other => Err(ApiError::bad_request(format!("Unknown match filter: {}", other))),
        }
    }
}

/// Derived per-player record. Never stored, always recomputed from the match log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PlayerStats {
    /// Decided matches only (`victories + defeats`), ties are left out.
    pub matches: u32,
    pub victories: u32,
    pub defeats: u32,
    pub points: u32,
    /// Win percentage rounded to one decimal.
    pub ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankingEntry {
    pub player: Player,
    pub stats: PlayerStats,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartnerStats {
    pub player: Player,
    pub matches: u32,
    pub victories: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BalancedTeams {
    pub team1: Team,
    pub team2: Team,
    pub referee: Option<Player>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HomeSummary {
    pub active_match: Option<Match>,
    pub recent_matches: Vec<Match>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    #[serde(default)]
    pub match_type: StatsFilter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_includes() {
        assert!(StatsFilter::All.includes(MatchType::Official));
        assert!(StatsFilter::All.includes(MatchType::Training));
        assert!(!StatsFilter::Official.includes(MatchType::Training));
        assert!(!StatsFilter::Training.includes(MatchType::Official));
    }

    #[test]
    fn test_filter_parsing() {
        assert_eq!("all".parse::<StatsFilter>().unwrap(), StatsFilter::All);
        assert_eq!(
            "entraînement".parse::<StatsFilter>().unwrap(),
            StatsFilter::Training
        );
        assert!("ranked".parse::<StatsFilter>().is_err());

        let query: StatsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.match_type, StatsFilter::All);
    }
}
