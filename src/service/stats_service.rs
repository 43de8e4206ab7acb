use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::api_error::ApiError;
use crate::models::*;
use crate::store::{degrade_listing, LeagueStore};

/// League points for a victory in an `officiel` match.
pub const OFFICIAL_WIN_POINTS: u32 = 3;

/// Number of finished matches shown on the home screen.
pub const HOME_RECENT_LIMIT: usize = 5;

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Fold a player's record over the finished matches accepted by `filter`.
///
/// Ties count as neither victory nor defeat, so `matches == victories + defeats`.
pub fn calculate_player_stats(player_id: &str, matches: &[Match], filter: StatsFilter) -> PlayerStats {
    let mut stats = PlayerStats::default();

    for m in matches {
        if m.status != MatchStatus::Finished || !filter.includes(m.match_type) {
            continue;
        }
        let Some(side) = m.side_of(player_id) else {
            continue;
        };
        let Some(winner) = m.winner() else {
            continue;
        };

        if winner == side {
            stats.victories += 1;
            if m.match_type == MatchType::Official {
                stats.points += OFFICIAL_WIN_POINTS;
            }
        } else {
            stats.defeats += 1;
        }
    }

    stats.matches = stats.victories + stats.defeats;
    if stats.matches > 0 {
        stats.ratio = round_one_decimal(stats.victories as f64 / stats.matches as f64 * 100.0);
    }
    stats
}

/// Rank every player. Official and combined rankings order by points then ratio,
/// training rankings by ratio then decided matches.
pub fn rank_players(players: &[Player], matches: &[Match], filter: StatsFilter) -> Vec<RankingEntry> {
    let mut ranking: Vec<RankingEntry> = players
        .iter()
        .map(|player| RankingEntry {
            stats: calculate_player_stats(&player.id, matches, filter),
            player: player.clone(),
        })
        .collect();

    match filter {
        StatsFilter::Training => ranking.sort_by(|a, b| {
            b.stats
                .ratio
                .total_cmp(&a.stats.ratio)
                .then(b.stats.matches.cmp(&a.stats.matches))
        }),
        StatsFilter::Official | StatsFilter::All => ranking.sort_by(|a, b| {
            b.stats
                .points
                .cmp(&a.stats.points)
                .then(b.stats.ratio.total_cmp(&a.stats.ratio))
        }),
    }
    ranking
}

/// Matches and wins shared with each teammate, most frequent partner first.
pub fn partner_stats(player_id: &str, matches: &[Match]) -> Vec<PartnerStats> {
    let mut partners: Vec<PartnerStats> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for m in matches.iter().filter(|m| m.status == MatchStatus::Finished) {
        let Some(side) = m.side_of(player_id) else {
            continue;
        };
        let won = m.winner() == Some(side);

        for partner in m.team(side).players.iter().filter(|p| p.id != player_id) {
            let slot = *index.entry(partner.id.clone()).or_insert_with(|| {
                partners.push(PartnerStats {
                    player: partner.clone(),
                    matches: 0,
                    victories: 0,
                });
                partners.len() - 1
            });
            partners[slot].matches += 1;
            if won {
                partners[slot].victories += 1;
            }
        }
    }

    partners.sort_by(|a, b| b.matches.cmp(&a.matches).then(b.victories.cmp(&a.victories)));
    partners
}

/// Finished matches, newest `end_date` first, optionally restricted to one player.
pub fn recent_matches(matches: &[Match], player_id: Option<&str>, limit: usize) -> Vec<Match> {
    let mut finished: Vec<&Match> = matches
        .iter()
        .filter(|m| m.status == MatchStatus::Finished)
        .filter(|m| player_id.map_or(true, |id| m.has_player(id)))
        .collect();

    finished.sort_by(|a, b| b.end_date.cmp(&a.end_date));
    finished.into_iter().take(limit).cloned().collect()
}

/// Active match (a live one first, otherwise one awaiting kick-off) plus the latest results.
pub fn home_summary(matches: &[Match]) -> HomeSummary {
    let active_match = matches
        .iter()
        .find(|m| m.status == MatchStatus::InProgress)
        .or_else(|| matches.iter().find(|m| m.status == MatchStatus::Pending))
        .cloned();

    HomeSummary {
        active_match,
        recent_matches: recent_matches(matches, None, HOME_RECENT_LIMIT),
    }
}

/// Read-only statistics over the store. Store outages degrade to empty listings.
pub struct StatsService<S> {
    store: Arc<S>,
}

impl<S: LeagueStore> StatsService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn finished_matches(&self, filter: StatsFilter) -> Result<Vec<Match>, ApiError> {
        let query = MatchFilter {
            match_type: filter.match_type(),
            ..MatchFilter::finished()
        };
        degrade_listing(self.store.get_matches(&query).await, "finished_matches")
    }

    pub async fn player_stats(&self, player_id: &str, filter: StatsFilter) -> Result<PlayerStats, ApiError> {
        let matches = self.finished_matches(filter).await?;
        Ok(calculate_player_stats(player_id, &matches, filter))
    }

    pub async fn ranking(&self, filter: StatsFilter) -> Result<Vec<RankingEntry>, ApiError> {
        let players = degrade_listing(
            self.store.get_players(&PlayerFilter::default()).await,
            "players",
        )?;
        let matches = self.finished_matches(filter).await?;

        debug!(
            players = players.len(),
            matches = matches.len(),
            filter = ?filter,
            "Computing ranking"
        );
        Ok(rank_players(&players, &matches, filter))
    }

    pub async fn partners(&self, player_id: &str) -> Result<Vec<PartnerStats>, ApiError> {
        let matches = self.finished_matches(StatsFilter::All).await?;
        Ok(partner_stats(player_id, &matches))
    }

    pub async fn home(&self) -> Result<HomeSummary, ApiError> {
        let matches = degrade_listing(
            self.store.get_matches(&MatchFilter::default()).await,
            "matches",
        )?;
        Ok(home_summary(&matches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::match_model::fixtures::{finished_match, new_match, player};
    use crate::store::MemoryStore;
    use chrono::{Duration, Utc};

    fn match_between(
        match_type: MatchType,
        team1: [&str; 2],
        team2: [&str; 2],
        scores: (i32, i32),
    ) -> Match {
        let mut m = Match::new(
            match_type,
            [player(team1[0]), player(team1[1])],
            [player(team2[0]), player(team2[1])],
            None,
        )
        .unwrap();
        m.team1.score = scores.0;
        m.team2.score = scores.1;
        m.finalize().unwrap();
        m
    }

    #[test]
    fn test_empty_stats() {
        let stats = calculate_player_stats("a", &[], StatsFilter::All);
        assert_eq!(stats, PlayerStats::default());
        assert_eq!(stats.ratio, 0.0);
    }

    #[test]
    fn test_official_win_scores_points() {
        let matches = vec![finished_match(MatchType::Official, 10, 0)];

        for id in ["a", "b"] {
            let stats = calculate_player_stats(id, &matches, StatsFilter::All);
            assert_eq!(stats.victories, 1);
            assert_eq!(stats.points, 3);
            assert_eq!(stats.ratio, 100.0);
        }
        for id in ["c", "d"] {
            let stats = calculate_player_stats(id, &matches, StatsFilter::All);
            assert_eq!(stats.defeats, 1);
            assert_eq!(stats.points, 0);
            assert_eq!(stats.matches, 1);
        }
    }

    #[test]
    fn test_training_win_has_no_points() {
        let matches = vec![finished_match(MatchType::Training, 10, 4)];
        let stats = calculate_player_stats("a", &matches, StatsFilter::All);
        assert_eq!(stats.victories, 1);
        assert_eq!(stats.points, 0);
    }

    #[test]
    fn test_tie_is_excluded() {
        let matches = vec![
            finished_match(MatchType::Official, 8, 8),
            finished_match(MatchType::Official, 10, 2),
        ];
        let stats = calculate_player_stats("c", &matches, StatsFilter::All);
        assert_eq!(stats.matches, 1);
        assert_eq!(stats.victories, 0);
        assert_eq!(stats.defeats, 1);
        assert_eq!(stats.ratio, 0.0);
    }

    #[test]
    fn test_unfinished_and_cancelled_ignored() {
        let mut live = new_match(MatchType::Official);
        live.start().unwrap();
        live.team1.score = 9;
        let mut cancelled = new_match(MatchType::Official);
        cancelled.team1.score = 5;
        cancelled.cancel().unwrap();

        let stats = calculate_player_stats("a", &[live, cancelled], StatsFilter::All);
        assert_eq!(stats, PlayerStats::default());
    }

    #[test]
    fn test_filter_by_type() {
        let matches = vec![
            finished_match(MatchType::Official, 10, 3),
            finished_match(MatchType::Training, 2, 10),
        ];
        let official = calculate_player_stats("a", &matches, StatsFilter::Official);
        assert_eq!((official.victories, official.defeats), (1, 0));
        let training = calculate_player_stats("a", &matches, StatsFilter::Training);
        assert_eq!((training.victories, training.defeats), (0, 1));
        let all = calculate_player_stats("a", &matches, StatsFilter::All);
        assert_eq!(all.matches, 2);
        assert_eq!(all.ratio, 50.0);
    }

    #[test]
    fn test_ratio_rounding() {
        let matches = vec![
            finished_match(MatchType::Training, 10, 1),
            finished_match(MatchType::Training, 1, 10),
            finished_match(MatchType::Training, 1, 10),
        ];
        let stats = calculate_player_stats("a", &matches, StatsFilter::All);
        assert_eq!(stats.ratio, 33.3);
        let stats = calculate_player_stats("c", &matches, StatsFilter::All);
        assert_eq!(stats.ratio, 66.7);
    }

    #[test]
    fn test_ranking_order() {
        let players: Vec<Player> = ["a", "b", "c", "d", "e", "f"].into_iter().map(player).collect();
        let matches = vec![
            match_between(MatchType::Official, ["a", "b"], ["c", "d"], (10, 5)),
            match_between(MatchType::Official, ["a", "e"], ["c", "f"], (10, 5)),
            match_between(MatchType::Training, ["f", "d"], ["a", "b"], (10, 0)),
        ];

        let official = rank_players(&players, &matches, StatsFilter::Official);
        assert_eq!(official[0].player.id, "a");
        assert_eq!(official[0].stats.points, 6);

        let training = rank_players(&players, &matches, StatsFilter::Training);
        assert_eq!(training[0].stats.ratio, 100.0);
        assert!(["f", "d"].contains(&training[0].player.id.as_str()));
        assert_eq!(training.len(), players.len());
    }

    #[test]
    fn test_partner_stats() {
        let matches = vec![
            match_between(MatchType::Official, ["a", "b"], ["c", "d"], (10, 5)),
            match_between(MatchType::Training, ["c", "a"], ["b", "d"], (3, 10)),
            match_between(MatchType::Official, ["b", "a"], ["c", "e"], (2, 10)),
        ];

        let partners = partner_stats("a", &matches);
        assert_eq!(partners.len(), 2);
        assert_eq!(partners[0].player.id, "b");
        assert_eq!(partners[0].matches, 2);
        assert_eq!(partners[0].victories, 1);
        assert_eq!(partners[1].player.id, "c");
        assert_eq!(partners[1].victories, 0);
    }

    #[test]
    fn test_recent_matches_and_home() {
        let now = Utc::now();
        let mut older = finished_match(MatchType::Official, 10, 1);
        older.end_date = Some(now - Duration::hours(2));
        let mut newer = finished_match(MatchType::Training, 10, 2);
        newer.end_date = Some(now - Duration::hours(1));
        let pending = new_match(MatchType::Official);
        let mut live = new_match(MatchType::Official);
        live.start().unwrap();

        let matches = vec![older.clone(), pending, newer.clone(), live.clone()];
        let recent = recent_matches(&matches, None, 5);
        assert_eq!(recent, vec![newer, older]);
        assert!(recent_matches(&matches, Some("z"), 5).is_empty());

        let home = home_summary(&matches);
        assert_eq!(home.active_match.map(|m| m.id), Some(live.id));
        assert_eq!(home.recent_matches.len(), 2);
    }

    #[tokio::test]
    async fn test_stats_are_idempotent() {
        let matches = vec![
            finished_match(MatchType::Official, 10, 0),
            finished_match(MatchType::Training, 4, 10),
            finished_match(MatchType::Official, 10, 7),
        ];

        let first = calculate_player_stats("a", &matches, StatsFilter::All);
        let second = calculate_player_stats("a", &matches, StatsFilter::All);
        assert_eq!(first, second);
        assert_eq!(first.matches, 3);
        assert_eq!(first.points, 6);

        let store = Arc::new(MemoryStore::new());
        store.save_player(&player("a")).await.unwrap();
        for m in &matches {
            store.save_match(m).await.unwrap();
        }
        let service = StatsService::new(store.clone());

        let first = service.player_stats("a", StatsFilter::All).await.unwrap();
        let second = service.player_stats("a", StatsFilter::All).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, calculate_player_stats("a", &matches, StatsFilter::All));

        let ranked_once = service.ranking(StatsFilter::Official).await.unwrap();
        let ranked_twice = service.ranking(StatsFilter::Official).await.unwrap();
        assert_eq!(ranked_once, ranked_twice);
    }

    #[tokio::test]
    async fn test_service_degrades_when_store_offline() {
        let store = Arc::new(MemoryStore::new());
        store.save_player(&player("a")).await.unwrap();
        store
            .save_match(&finished_match(MatchType::Official, 10, 0))
            .await
            .unwrap();
        let service = StatsService::new(store.clone());

        let stats = service.player_stats("a", StatsFilter::All).await.unwrap();
        assert_eq!(stats.points, 3);

        store.set_offline(true);
        assert!(service.ranking(StatsFilter::All).await.unwrap().is_empty());
        let stats = service.player_stats("a", StatsFilter::All).await.unwrap();
        assert_eq!(stats, PlayerStats::default());
        assert!(service.home().await.unwrap().active_match.is_none());
    }
}
