use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::api_error::ApiError;
use crate::models::{BalancedTeams, Match, Player, StatsFilter, Team};
use crate::service::stats_service::calculate_player_stats;

/// Players needed on the table.
pub const TEAM_SEATS: usize = 4;

/// Pick the four least-played players, shuffle them into two teams and seat the
/// fifth least-played as referee when there is one.
///
/// The sort is stable, so players with equal play counts keep their input order.
pub fn generate_balanced_teams<R: Rng + ?Sized>(
    players: &[Player],
    matches: &[Match],
    filter: StatsFilter,
    rng: &mut R,
) -> Result<BalancedTeams, ApiError> {
    if players.len() < TEAM_SEATS {
        return Err(ApiError::InsufficientPlayers {
            available: players.len(),
        });
    }

    let mut by_activity: Vec<(u32, &Player)> = players
        .iter()
        .map(|p| (calculate_player_stats(&p.id, matches, filter).matches, p))
        .collect();
    by_activity.sort_by_key(|(played, _)| *played);

    let referee = by_activity.get(TEAM_SEATS).map(|(_, p)| (*p).clone());
    let mut seated: Vec<Player> = by_activity
        .into_iter()
        .take(TEAM_SEATS)
        .map(|(_, p)| p.clone())
        .collect();
    seated.shuffle(rng);

    debug!(
        seated = ?seated.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
        referee = ?referee.as_ref().map(|p| p.id.as_str()),
        "Generated balanced teams"
    );

    let mut seated = seated.into_iter();
    match (seated.next(), seated.next(), seated.next(), seated.next()) {
        (Some(p1), Some(p2), Some(p3), Some(p4)) => Ok(BalancedTeams {
            team1: Team::new([p1, p2]),
            team2: Team::new([p3, p4]),
            referee,
        }),
        _ => Err(ApiError::InternalServerError),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::match_model::fixtures::{finished_match, player};
    use crate::models::MatchType;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn roster(ids: &[&str]) -> Vec<Player> {
        ids.iter().map(|id| player(id)).collect()
    }

    fn seated_ids(teams: &BalancedTeams) -> HashSet<String> {
        teams
            .team1
            .players
            .iter()
            .chain(teams.team2.players.iter())
            .map(|p| p.id.clone())
            .collect()
    }

    #[test]
    fn test_requires_four_players() {
        let mut rng = StdRng::seed_from_u64(7);
        let result = generate_balanced_teams(&roster(&["a", "b", "c"]), &[], StatsFilter::All, &mut rng);
        assert!(matches!(
            result,
            Err(ApiError::InsufficientPlayers { available: 3 })
        ));
    }

    #[test]
    fn test_four_players_no_referee() {
        let mut rng = StdRng::seed_from_u64(7);
        let teams =
            generate_balanced_teams(&roster(&["a", "b", "c", "d"]), &[], StatsFilter::All, &mut rng)
                .unwrap();

        assert!(teams.referee.is_none());
        assert_eq!(seated_ids(&teams).len(), 4);
        assert_eq!(teams.team1.score, 0);
        assert_eq!(teams.team2.score, 0);
    }

    #[test]
    fn test_five_players_get_a_referee() {
        let mut rng = StdRng::seed_from_u64(42);
        let teams = generate_balanced_teams(
            &roster(&["a", "b", "c", "d", "e"]),
            &[],
            StatsFilter::All,
            &mut rng,
        )
        .unwrap();

        let referee = teams.referee.clone().unwrap();
        assert_eq!(referee.id, "e");
        assert!(!seated_ids(&teams).contains(&referee.id));
    }

    #[test]
    fn test_least_played_are_seated() {
        // a, b, c and d each have one finished match; e, f, g, h have none.
        let history = vec![finished_match(MatchType::Official, 10, 4)];
        let players = roster(&["a", "b", "c", "d", "e", "f", "g", "h"]);

        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let teams = generate_balanced_teams(&players, &history, StatsFilter::All, &mut rng).unwrap();
            let seated = seated_ids(&teams);
            for id in ["e", "f", "g", "h"] {
                assert!(seated.contains(id));
            }
            assert_eq!(teams.referee.unwrap().id, "a");
        }
    }

    #[test]
    fn test_filter_changes_activity() {
        let history = vec![finished_match(MatchType::Training, 10, 4)];
        let players = roster(&["a", "b", "c", "d", "e"]);
        let mut rng = StdRng::seed_from_u64(3);

        let official = generate_balanced_teams(&players, &history, StatsFilter::Official, &mut rng).unwrap();
        assert_eq!(official.referee.unwrap().id, "e");

        let all = generate_balanced_teams(&players, &history, StatsFilter::All, &mut rng).unwrap();
        assert!(seated_ids(&all).contains("e"));
    }

    #[test]
    fn test_same_seed_same_teams() {
        let players = roster(&["a", "b", "c", "d"]);
        let first =
            generate_balanced_teams(&players, &[], StatsFilter::All, &mut StdRng::seed_from_u64(9)).unwrap();
        let second =
            generate_balanced_teams(&players, &[], StatsFilter::All, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(first, second);
    }
}
