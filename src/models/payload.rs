use serde::Deserialize;

use crate::error::{AppError, AppResult};

// ============================================================================
// Jikan v4 Types
// ============================================================================

/// Genre (or theme) reference as both APIs return it
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GenreRef {
    #[serde(default)]
    pub name: Option<String>,
}

/// One entry of Jikan's `/top/anime` list
///
/// Required keys are still `Option` here so a malformed entry surfaces as a
/// schema error from the normalizer rather than a deserialization failure of
/// the whole page.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct JikanAnime {
    #[serde(default)]
    pub mal_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub scored_by: Option<u64>,
    #[serde(default)]
    pub genres: Vec<GenreRef>,
    #[serde(rename = "type", default)]
    pub anime_type: Option<String>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub airing: Option<bool>,
    #[serde(default)]
    pub members: Option<u64>,
}

// ============================================================================
// MyAnimeList v2 Types
// ============================================================================

/// Node wrapper entry of MAL's `/anime/ranking` list
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MalRankingEntry {
    pub node: MalAnimeNode,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MalAnimeNode {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub num_scoring_users: Option<u64>,
    #[serde(default)]
    pub genres: Vec<GenreRef>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub num_episodes: Option<u32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub num_list_users: Option<u64>,
}

/// A metadata payload from either upstream source
#[derive(Debug, Clone, PartialEq)]
pub enum SourcePayload {
    Jikan(JikanAnime),
    MalRanking(MalRankingEntry),
}

impl SourcePayload {
    /// Classifies a raw JSON item by shape; a `node` object selects the MAL shape
    pub fn from_value(value: serde_json::Value) -> AppResult<Self> {
        if !value.is_object() {
            return Err(AppError::Schema(format!(
                "Expected an object payload, got: {}",
                value
            )));
        }

        let payload = if value.get("node").map_or(false, |n| n.is_object()) {
            SourcePayload::MalRanking(
                serde_json::from_value(value)
                    .map_err(|e| AppError::Schema(format!("Malformed MAL payload: {}", e)))?,
            )
        } else {
            SourcePayload::Jikan(
                serde_json::from_value(value)
                    .map_err(|e| AppError::Schema(format!("Malformed Jikan payload: {}", e)))?,
            )
        };

        Ok(payload)
    }

    pub fn source_name(&self) -> &'static str {
        match self {
            SourcePayload::Jikan(_) => "jikan",
            SourcePayload::MalRanking(_) => "mal",
        }
    }
}
