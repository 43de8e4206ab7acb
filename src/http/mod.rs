pub mod health;
pub mod match_handler;
pub mod player_handler;
pub mod stats_handler;

use actix_web::web;
use std::sync::Arc;

use crate::models::StatsFilter;
use crate::service::{MatchNotifier, MatchService, PlayerNotifier, PlayerService, StatsService};
use crate::store::LeagueStore;

/// Services shared by every handler, generic over the backing store.
pub struct AppState<S> {
    pub store: Arc<S>,
    pub players: PlayerService<S>,
    pub matches: MatchService<S>,
    pub stats: StatsService<S>,
}

impl<S: LeagueStore> AppState<S> {
    pub fn new(
        store: Arc<S>,
        notifier: Arc<dyn MatchNotifier>,
        player_notifier: Arc<dyn PlayerNotifier>,
        avatar_base_url: &str,
        balance_filter: StatsFilter,
    ) -> Self {
        Self {
            players: PlayerService::new(store.clone(), player_notifier, avatar_base_url),
            matches: MatchService::new(store.clone(), notifier, balance_filter),
            stats: StatsService::new(store.clone()),
            store,
        }
    }
}

/// Register every API route. Scopes with a fixed prefix go before the bare `/api` routes.
pub fn configure_routes<S: LeagueStore + 'static>(cfg: &mut web::ServiceConfig) {
    player_handler::configure_routes::<S>(cfg);
    match_handler::configure_routes::<S>(cfg);
    stats_handler::configure_routes::<S>(cfg);
    cfg.route("/api/health", web::get().to(health::health_check::<S>));
}
