// Service layer for the league
pub mod match_service;
pub mod notification_service;
pub mod player_service;
pub mod scoring;
pub mod stats_service;
pub mod team_generator;


pub use match_service::MatchService;
pub use notification_service::{MatchNotifier, NoopNotifier, PlayerNotifier, WebhookNotifier};
pub use player_service::PlayerService;
pub use stats_service::StatsService;
