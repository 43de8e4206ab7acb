use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::NotificationConfig;
use crate::models::{Match, MatchType, Player, TeamSide};

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);
const OFFICIAL_COLOR: u32 = 0x27ae60;
const TRAINING_COLOR: u32 = 0x3498db;
const APP_NAME: &str = "BabyLeague";

/// Receives finished matches. Delivery is fire-and-forget: implementations
/// must not block the caller or report failures back to it.
pub trait MatchNotifier: Send + Sync {
    fn match_finished(&self, m: &Match);
}

/// Receives newly registered players, same delivery rules as [`MatchNotifier`].
pub trait PlayerNotifier: Send + Sync {
    fn player_created(&self, player: &Player);
}

/// Drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl MatchNotifier for NoopNotifier {
    fn match_finished(&self, m: &Match) {
        debug!(match_id = %m.id, "No notifier configured, skipping");
    }
}

impl PlayerNotifier for NoopNotifier {
    fn player_created(&self, player: &Player) {
        debug!(player_id = %player.id, "No welcome sink configured, skipping");
    }
}

/// Flat row describing a finished match, as consumed by spreadsheet-style automations.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchExportPayload {
    pub event: &'static str,
    pub match_id: String,
    #[serde(rename = "type")]
    pub match_type: MatchType,
    pub status: String,
    pub end_date: Option<DateTime<Utc>>,
    pub team1_players: String,
    pub team2_players: String,
    pub team1_score: i32,
    pub team2_score: i32,
    pub referee: String,
    pub bet: String,
    pub winner: String,
}

pub fn build_export_payload(m: &Match) -> MatchExportPayload {
    MatchExportPayload {
        event: "match_finished",
        match_id: m.id.clone(),
        match_type: m.match_type,
        status: m.status.to_string(),
        end_date: m.end_date,
        team1_players: m.team1.names(" / "),
        team2_players: m.team2.names(" / "),
        team1_score: m.team1.score,
        team2_score: m.team2.score,
        referee: m.referee.as_ref().map(|r| r.name.clone()).unwrap_or_default(),
        bet: m.bet.map(|b| b.to_string()).unwrap_or_default(),
        winner: m
            .winner()
            .map(|w| w.to_string())
            .unwrap_or_else(|| "draw".to_string()),
    }
}

/// Welcome message parameters for a new player, keyed the way mail templates expect.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WelcomePayload {
    pub event: &'static str,
    pub player_id: String,
    pub to_name: String,
    pub to_email: String,
    pub player_name: String,
    pub app_name: &'static str,
    /// Registration day as `dd/mm/yyyy`.
    pub created_date: String,
}

pub fn build_welcome_payload(player: &Player, created_at: DateTime<Utc>) -> WelcomePayload {
    WelcomePayload {
        event: "player_created",
        player_id: player.id.clone(),
        to_name: player.name.clone(),
        to_email: player.email.clone(),
        player_name: player.name.clone(),
        app_name: APP_NAME,
        created_date: created_at.format("%d/%m/%Y").to_string(),
    }
}

/// Chat webhook message announcing the final score.
pub fn build_chat_message(m: &Match) -> Value {
    let headline = format!(
        "🏁 **Match terminé** : Équipe rouge ({}) vs Équipe bleue ({})",
        m.team1.score, m.team2.score
    );
    let verdict = match m.winner() {
        Some(TeamSide::Team1) => format!("Victoire de **{}** 🔥", m.team1.names(" et ")),
        Some(TeamSide::Team2) => format!("Victoire de **{}** 🔥", m.team2.names(" et ")),
        None => "Match nul".to_string(),
    };
    let (label, color) = match m.match_type {
        MatchType::Official => ("Officiel", OFFICIAL_COLOR),
        MatchType::Training => ("Entraînement", TRAINING_COLOR),
    };

    json!({
        "content": format!("{}\n\n{}\nType : {}", headline, verdict, label),
        "embeds": [{
            "color": color,
            "fields": [
                { "name": "Équipe Rouge", "value": m.team1.names(" / "), "inline": true },
                { "name": "Équipe Bleue", "value": m.team2.names(" / "), "inline": true },
                {
                    "name": "Score final",
                    "value": format!("{} - {}", m.team1.score, m.team2.score),
                    "inline": false
                }
            ],
            "timestamp": m.end_date.unwrap_or_else(Utc::now).to_rfc3339()
        }]
    })
}

/// Posts finished matches to the configured export and chat webhooks, and new
/// players to the welcome webhook. Unset URLs are skipped.
pub struct WebhookNotifier {
    client: reqwest::Client,
    export_url: Option<String>,
    chat_url: Option<String>,
    welcome_url: Option<String>,
}

impl WebhookNotifier {
    pub fn new(config: &NotificationConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default webhook client");
                reqwest::Client::new()
            });

        Self {
            client,
            export_url: config.match_export_webhook_url.clone(),
            chat_url: config.discord_webhook_url.clone(),
            welcome_url: config.welcome_webhook_url.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.export_url.is_some() || self.chat_url.is_some() || self.welcome_url.is_some()
    }

    fn post<T: Serialize + Send + 'static>(&self, sink: &'static str, url: &str, body: T, subject: &str) {
        let client = self.client.clone();
        let url = url.to_string();
        let subject = subject.to_string();

        tokio::spawn(async move {
            match client.post(&url).json(&body).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(sink, subject = %subject, "Webhook delivered");
                }
                Ok(response) => {
                    warn!(
                        sink,
                        subject = %subject,
                        status = %response.status(),
                        "Webhook rejected notification"
                    );
                }
                Err(e) => {
                    warn!(sink, subject = %subject, error = %e, "Webhook delivery failed");
                }
            }
        });
    }
}

impl MatchNotifier for WebhookNotifier {
    fn match_finished(&self, m: &Match) {
        if let Some(url) = self.export_url.as_deref() {
            self.post("export", url, build_export_payload(m), &m.id);
        }
        if let Some(url) = self.chat_url.as_deref() {
            self.post("chat", url, build_chat_message(m), &m.id);
        }
    }
}

impl PlayerNotifier for WebhookNotifier {
    fn player_created(&self, player: &Player) {
        let Some(url) = self.welcome_url.as_deref() else {
            debug!(player_id = %player.id, "Welcome webhook not configured, skipping");
            return;
        };
        self.post("welcome", url, build_welcome_payload(player, Utc::now()), &player.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::match_model::fixtures::{finished_match, player};

    #[test]
    fn test_export_payload() {
        let mut m = finished_match(MatchType::Official, 10, 4);
        m.referee = Some(player("e"));
        m.bet = Some(TeamSide::Team2);

        let payload = build_export_payload(&m);
        assert_eq!(payload.event, "match_finished");
        assert_eq!(payload.team1_players, "A / B");
        assert_eq!(payload.team2_players, "C / D");
        assert_eq!(payload.referee, "E");
        assert_eq!(payload.bet, "team2");
        assert_eq!(payload.winner, "team1");

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "officiel");
        assert_eq!(json["status"], "terminé");
        assert_eq!(json["matchId"], m.id.as_str());
        assert_eq!(json["team2Score"], 4);
    }

    #[test]
    fn test_export_payload_draw_and_blanks() {
        let m = finished_match(MatchType::Training, 7, 7);
        let payload = build_export_payload(&m);
        assert_eq!(payload.winner, "draw");
        assert_eq!(payload.referee, "");
        assert_eq!(payload.bet, "");
    }

    #[test]
    fn test_chat_message() {
        let m = finished_match(MatchType::Training, 3, 10);
        let message = build_chat_message(&m);

        let content = message["content"].as_str().unwrap();
        assert!(content.contains("Victoire de **C et D**"));
        assert!(content.contains("Type : Entraînement"));

        let embed = &message["embeds"][0];
        assert_eq!(embed["color"], TRAINING_COLOR);
        assert_eq!(embed["fields"][2]["value"], "3 - 10");
    }

    #[test]
    fn test_welcome_payload() {
        let created_at = DateTime::parse_from_rfc3339("2026-03-09T08:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let payload = build_welcome_payload(&player("a"), created_at);
        assert_eq!(payload.to_name, "A");
        assert_eq!(payload.to_email, "a@example.com");
        assert_eq!(payload.created_date, "09/03/2026");

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["event"], "player_created");
        assert_eq!(json["app_name"], "BabyLeague");
        assert_eq!(json["player_name"], "A");
    }

    #[test]
    fn test_unconfigured_webhooks() {
        let notifier = WebhookNotifier::new(&NotificationConfig::default());
        assert!(!notifier.is_configured());
        // Nothing is spawned, so this is safe outside a runtime.
        notifier.match_finished(&finished_match(MatchType::Official, 10, 0));
        notifier.player_created(&player("a"));
    }

    #[test]
    fn test_welcome_url_alone_is_configured() {
        let notifier = WebhookNotifier::new(&NotificationConfig {
            welcome_webhook_url: Some("https://hooks.test/welcome".to_string()),
            ..NotificationConfig::default()
        });
        assert!(notifier.is_configured());
    }
}
