use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

use crate::api_error::ApiError;

/// Avatar styles offered by the avatar-image service.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AvatarStyle {
    #[default]
    Avataaars,
    Bottts,
    Adventurer,
    BigSmile,
    Lorelei,
    Personas,
    Thumbs,
    FunEmoji,
}

impl AvatarStyle {
    pub const ALL: [AvatarStyle; 8] = [
        AvatarStyle::Avataaars,
        AvatarStyle::Bottts,
        AvatarStyle::Adventurer,
        AvatarStyle::BigSmile,
        AvatarStyle::Lorelei,
        AvatarStyle::Personas,
        AvatarStyle::Thumbs,
        AvatarStyle::FunEmoji,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AvatarStyle::Avataaars => "avataaars",
            AvatarStyle::Bottts => "bottts",
            AvatarStyle::Adventurer => "adventurer",
            AvatarStyle::BigSmile => "big-smile",
            AvatarStyle::Lorelei => "lorelei",
            AvatarStyle::Personas => "personas",
            AvatarStyle::Thumbs => "thumbs",
            AvatarStyle::FunEmoji => "fun-emoji",
        }
    }
}

impl std::fmt::Display for AvatarStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AvatarStyle {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AvatarStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown avatar style: {}", s)))
    }
}

/// A registered league player.
///
/// `avatar_style` and `creator_id` are nullable: an absent style renders with
/// [`AvatarStyle::Avataaars`], an absent creator means the player signed up directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar_style: Option<AvatarStyle>,
    #[serde(default)]
    pub creator_id: Option<String>,
}

impl Player {
    /// Stand-in for a roster slot whose player record no longer exists.
    pub fn unknown(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            email: String::new(),
            avatar_style: None,
            creator_id: None,
        }
    }

    pub fn avatar(&self, base_url: &str) -> Result<PlayerAvatar, ApiError> {
        let style = self.avatar_style.unwrap_or_default();
        // The name keeps the avatar stable across id migrations.
        let seed = if self.name.trim().is_empty() {
            self.id.as_str()
        } else {
            self.name.as_str()
        };

        Ok(PlayerAvatar {
            url: avatar_url(base_url, seed, style)?,
            style,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerAvatar {
    pub url: String,
    pub style: AvatarStyle,
}

/// Build the avatar-image URL for a seed string and a style.
pub fn avatar_url(base_url: &str, seed: &str, style: AvatarStyle) -> Result<String, ApiError> {
    let endpoint = format!("{}/{}/svg", base_url.trim_end_matches('/'), style.as_str());
    let url = reqwest::Url::parse_with_params(
        &endpoint,
        &[("seed", seed), ("backgroundColor", "091C3E"), ("radius", "50")],
    )
    .map_err(|e| ApiError::bad_request(format!("Invalid avatar service URL: {}", e)))?;

    Ok(url.to_string())
}

/// Create (no `id`) or update (with `id`) a player.
#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SavePlayerRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub avatar_style: Option<AvatarStyle>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerFilter {
    pub creator_id: Option<String>,
}

impl PlayerFilter {
    pub fn created_by(creator_id: impl Into<String>) -> Self {
        Self {
            creator_id: Some(creator_id.into()),
        }
    }

    pub fn matches(&self, player: &Player) -> bool {
        match &self.creator_id {
            Some(creator) => player.creator_id.as_deref() == Some(creator.as_str()),
            None => true,
        }
    }
}
