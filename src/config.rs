use serde::Deserialize;
use std::env;

use crate::models::StatsFilter;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub notifications: NotificationConfig,
    pub avatar: AvatarConfig,
    pub league: LeagueConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub rust_log: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NotificationConfig {
    pub match_export_webhook_url: Option<String>,
    pub discord_webhook_url: Option<String>,
    pub welcome_webhook_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AvatarConfig {
    pub base_url: String,
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dicebear.com/7.x".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LeagueConfig {
    /// Match filter used to count play time when balancing teams.
    pub team_balance_filter: StatsFilter,
}

impl Default for LeagueConfig {
    fn default() -> Self {
        Self {
            team_balance_filter: StatsFilter::All,
        }
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;
        let max_connections: u32 = match optional_var("DB_MAX_CONNECTIONS") {
            Some(value) => value.parse()?,
            None => 5,
        };
        let port: u16 = env::var("PORT")?.parse()?;
        let host = env::var("HOST")?;
        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let team_balance_filter = match optional_var("TEAM_BALANCE_FILTER") {
            Some(value) => match value.parse::<StatsFilter>()? {
                StatsFilter::Training => {
                    anyhow::bail!("TEAM_BALANCE_FILTER must be `all` or `officiel`")
                }
                filter => filter,
            },
            None => StatsFilter::All,
        };

        Ok(Config {
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            server: ServerConfig {
                port,
                host,
                rust_log,
            },
            notifications: NotificationConfig {
                match_export_webhook_url: optional_var("MATCH_EXPORT_WEBHOOK_URL"),
                discord_webhook_url: optional_var("DISCORD_WEBHOOK_URL"),
                welcome_webhook_url: optional_var("WELCOME_WEBHOOK_URL"),
            },
            avatar: AvatarConfig {
                base_url: optional_var("AVATAR_BASE_URL")
                    .unwrap_or_else(|| AvatarConfig::default().base_url),
            },
            league: LeagueConfig {
                team_balance_filter,
            },
        })
    }
}
