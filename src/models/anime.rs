use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;

/// Joins genre names in tabular exports
pub const GENRE_SEPARATOR: &str = ", ";

/// Airing status of a title, shared by both upstream sources
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AiringStatus {
    Airing,
    Finished,
    NotYetAired,
}

impl AiringStatus {
    /// Parses either source's spelling (`"Currently Airing"`, `"currently_airing"`, ...)
    pub fn parse(raw: &str) -> Option<Self> {
        let canonical = raw.trim().to_lowercase().replace([' ', '-'], "_");
        match canonical.as_str() {
            "currently_airing" | "airing" => Some(AiringStatus::Airing),
            "finished_airing" | "finished" => Some(AiringStatus::Finished),
            "not_yet_aired" | "upcoming" => Some(AiringStatus::NotYetAired),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AiringStatus::Airing => "airing",
            AiringStatus::Finished => "finished",
            AiringStatus::NotYetAired => "not_yet_aired",
        }
    }
}

impl Display for AiringStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical anime record produced by the normalizer
///
/// Every field other than `id` and `title` is optional: a value the upstream
/// payload did not carry is `None` (or an empty genre set), never a guess.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnimeRecord {
    pub id: i64,
    pub title: String,
    /// Community mean score on the 0-10 scale
    pub mean_score: Option<f64>,
    pub scored_by_count: Option<u64>,
    pub genres: BTreeSet<String>,
    /// Canonical snake_case media type (`tv`, `movie`, `tv_special`, ...)
    pub media_type: Option<String>,
    pub episode_count: Option<u32>,
    pub status: Option<AiringStatus>,
    /// Member count; larger means more popular
    pub popularity_proxy: Option<u64>,
    /// Set once by the hype aggregator, in [-1, 1]
    pub hype_score: Option<f64>,
}

impl AnimeRecord {
    /// Returns a copy of this record carrying the given hype score
    pub fn with_hype(&self, hype_score: f64) -> Self {
        Self {
            hype_score: Some(hype_score.clamp(-1.0, 1.0)),
            ..self.clone()
        }
    }

    /// Genres joined the way the tabular exports store them
    pub fn genres_joined(&self) -> String {
        self.genres.iter().cloned().collect::<Vec<_>>().join(GENRE_SEPARATOR)
    }
}

/// Canonicalizes a media type label so both sources agree (`"TV Special"` -> `tv_special`)
pub fn canonical_media_type(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let canonical = trimmed
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    match canonical.as_str() {
        "unknown" => None,
        _ => Some(canonical),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> AnimeRecord {
        AnimeRecord {
            id: 52991,
            title: "Sousou no Frieren".to_string(),
            mean_score: Some(9.3),
            scored_by_count: Some(500_000),
            genres: ["Adventure", "Drama", "Fantasy"]
                .iter()
                .map(|g| g.to_string())
                .collect(),
            media_type: Some("tv".to_string()),
            episode_count: Some(28),
            status: Some(AiringStatus::Finished),
            popularity_proxy: Some(1_000_000),
            hype_score: None,
        }
    }

    #[test]
    fn test_status_parse_both_spellings() {
        assert_eq!(AiringStatus::parse("Currently Airing"), Some(AiringStatus::Airing));
        assert_eq!(AiringStatus::parse("currently_airing"), Some(AiringStatus::Airing));
        assert_eq!(AiringStatus::parse("Finished Airing"), Some(AiringStatus::Finished));
        assert_eq!(AiringStatus::parse("not_yet_aired"), Some(AiringStatus::NotYetAired));
        assert_eq!(AiringStatus::parse("Not yet aired"), Some(AiringStatus::NotYetAired));
        assert_eq!(AiringStatus::parse("on hiatus"), None);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&AiringStatus::NotYetAired).unwrap();
        assert_eq!(json, "\"not_yet_aired\"");
    }

    #[test]
    fn test_canonical_media_type() {
        assert_eq!(canonical_media_type("TV"), Some("tv".to_string()));
        assert_eq!(canonical_media_type("TV Special"), Some("tv_special".to_string()));
        assert_eq!(canonical_media_type("tv_special"), Some("tv_special".to_string()));
        assert_eq!(canonical_media_type("Movie"), Some("movie".to_string()));
        assert_eq!(canonical_media_type("  "), None);
        assert_eq!(canonical_media_type("unknown"), None);
    }

    #[test]
    fn test_with_hype_clamps_and_leaves_original_untouched() {
        let record = sample_record();
        let enriched = record.with_hype(1.7);
        assert_eq!(enriched.hype_score, Some(1.0));
        assert_eq!(record.hype_score, None);
        assert_eq!(enriched.title, record.title);
    }

    #[test]
    fn test_genres_joined_is_sorted() {
        assert_eq!(sample_record().genres_joined(), "Adventure, Drama, Fantasy");
    }
}
