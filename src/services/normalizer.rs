/// Metadata normalizer
///
/// Maps either upstream payload shape (Jikan "top anime" entries or MAL
/// ranking entries with a `node` wrapper) onto one canonical `AnimeRecord`.
/// Pure transformation: no network, no disk.
use std::collections::{BTreeSet, HashSet};

use crate::{
    error::{AppError, AppResult},
    models::{
        canonical_media_type, AiringStatus, AnimeRecord, GenreRef, JikanAnime, MalAnimeNode,
        SourcePayload,
    },
};

fn genre_names(genres: &[GenreRef]) -> BTreeSet<String> {
    genres
        .iter()
        .filter_map(|g| g.name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn require_id(id: Option<i64>) -> AppResult<i64> {
    id.ok_or_else(|| AppError::Schema("Payload is missing its id".to_string()))
}

fn require_title(title: Option<String>, id: i64) -> AppResult<String> {
    match title.map(|t| t.trim().to_string()) {
        Some(t) if !t.is_empty() => Ok(t),
        _ => Err(AppError::Schema(format!("Payload {} is missing its title", id))),
    }
}

fn check_mean_score(score: Option<f64>, id: i64) -> AppResult<Option<f64>> {
    match score {
        Some(s) if !(0.0..=10.0).contains(&s) => Err(AppError::Schema(format!(
            "Payload {} has mean score {} outside [0, 10]",
            id, s
        ))),
        other => Ok(other),
    }
}

impl TryFrom<JikanAnime> for AnimeRecord {
    type Error = AppError;

    fn try_from(anime: JikanAnime) -> AppResult<Self> {
        let id = require_id(anime.mal_id)?;
        let title = require_title(anime.title, id)?;
        let mean_score = check_mean_score(anime.score, id)?;

        // Jikan sometimes ships an unknown status string; the airing flag is authoritative then
        let status = anime
            .status
            .as_deref()
            .and_then(AiringStatus::parse)
            .or_else(|| match anime.airing {
                Some(true) => Some(AiringStatus::Airing),
                _ => None,
            });

        Ok(AnimeRecord {
            id,
            title,
            mean_score,
            scored_by_count: anime.scored_by,
            genres: genre_names(&anime.genres),
            media_type: anime.anime_type.as_deref().and_then(canonical_media_type),
            episode_count: anime.episodes,
            status,
            popularity_proxy: anime.members,
            hype_score: None,
        })
    }
}

impl TryFrom<MalAnimeNode> for AnimeRecord {
    type Error = AppError;

    fn try_from(node: MalAnimeNode) -> AppResult<Self> {
        let id = require_id(node.id)?;
        let title = require_title(node.title, id)?;
        let mean_score = check_mean_score(node.mean, id)?;

        Ok(AnimeRecord {
            id,
            title,
            mean_score,
            scored_by_count: node.num_scoring_users,
            genres: genre_names(&node.genres),
            media_type: node.media_type.as_deref().and_then(canonical_media_type),
            // MAL reports 0 episodes when the count is not known yet
            episode_count: node.num_episodes.filter(|&n| n > 0),
            status: node.status.as_deref().and_then(AiringStatus::parse),
            popularity_proxy: node.num_list_users,
            hype_score: None,
        })
    }
}

/// Normalizes one payload into a canonical record
pub fn normalize(payload: SourcePayload) -> AppResult<AnimeRecord> {
    match payload {
        SourcePayload::Jikan(anime) => AnimeRecord::try_from(anime),
        SourcePayload::MalRanking(entry) => AnimeRecord::try_from(entry.node),
    }
}

/// Normalizes one raw JSON item, detecting its shape first
pub fn normalize_value(value: serde_json::Value) -> AppResult<AnimeRecord> {
    normalize(SourcePayload::from_value(value)?)
}

/// Normalizes a batch of raw items
///
/// Malformed items are logged and skipped; a repeated id keeps its first
/// occurrence. Input order is preserved.
pub fn normalize_batch(values: Vec<serde_json::Value>) -> Vec<AnimeRecord> {
    let total = values.len();
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(total);

    for (index, value) in values.into_iter().enumerate() {
        match normalize_value(value) {
            Ok(record) => {
                if seen.insert(record.id) {
                    records.push(record);
                } else {
                    tracing::warn!(id = record.id, title = %record.title, "Dropping duplicate anime id");
                }
            }
            Err(e) => {
                tracing::warn!(index = index, error = %e, "Skipping malformed payload");
            }
        }
    }

    tracing::info!(
        received = total,
        normalized = records.len(),
        "Metadata normalization completed"
    );

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jikan_frieren() -> serde_json::Value {
        json!({
            "mal_id": 52991,
            "title": "Sousou no Frieren",
            "score": 9.3,
            "scored_by": 512345,
            "genres": [
                {"mal_id": 2, "type": "anime", "name": "Adventure"},
                {"mal_id": 8, "type": "anime", "name": "Drama"},
                {"mal_id": 10, "type": "anime", "name": "Fantasy"}
            ],
            "type": "TV",
            "episodes": 28,
            "status": "Finished Airing",
            "airing": false,
            "members": 1200000,
            "popularity": 150
        })
    }

    fn mal_frieren() -> serde_json::Value {
        json!({
            "node": {
                "id": 52991,
                "title": "Sousou no Frieren",
                "main_picture": {"medium": "https://example.invalid/a.jpg"},
                "mean": 9.3,
                "num_scoring_users": 512345,
                "genres": [
                    {"id": 10, "name": "Fantasy"},
                    {"id": 2, "name": "Adventure"},
                    {"id": 8, "name": "Drama"}
                ],
                "media_type": "tv",
                "num_episodes": 28,
                "status": "finished_airing",
                "num_list_users": 1200000
            },
            "ranking": {"rank": 1}
        })
    }

    #[test]
    fn test_both_shapes_normalize_to_equal_records() {
        let from_jikan = normalize_value(jikan_frieren()).unwrap();
        let from_mal = normalize_value(mal_frieren()).unwrap();
        assert_eq!(from_jikan, from_mal);
    }

    #[test]
    fn test_jikan_fields_mapped() {
        let record = normalize_value(jikan_frieren()).unwrap();
        assert_eq!(record.id, 52991);
        assert_eq!(record.mean_score, Some(9.3));
        assert_eq!(record.media_type, Some("tv".to_string()));
        assert_eq!(record.status, Some(AiringStatus::Finished));
        assert_eq!(record.popularity_proxy, Some(1_200_000));
        assert!(record.genres.contains("Drama"));
        assert_eq!(record.hype_score, None);
    }

    #[test]
    fn test_missing_fields_become_none() {
        let record = normalize_value(json!({"mal_id": 5, "title": "Mystery Show"})).unwrap();
        assert_eq!(record.mean_score, None);
        assert_eq!(record.scored_by_count, None);
        assert!(record.genres.is_empty());
        assert_eq!(record.media_type, None);
        assert_eq!(record.episode_count, None);
        assert_eq!(record.status, None);
        assert_eq!(record.popularity_proxy, None);
    }

    #[test]
    fn test_missing_id_is_schema_error() {
        let result = normalize_value(json!({"title": "No Id"}));
        assert!(matches!(result, Err(AppError::Schema(_))));

        let result = normalize_value(json!({"node": {"title": "No Id"}}));
        assert!(matches!(result, Err(AppError::Schema(_))));
    }

    #[test]
    fn test_blank_title_is_schema_error() {
        let result = normalize_value(json!({"mal_id": 9, "title": "   "}));
        assert!(matches!(result, Err(AppError::Schema(_))));
    }

    #[test]
    fn test_out_of_range_score_is_schema_error() {
        let result = normalize_value(json!({"mal_id": 9, "title": "Broken", "score": 11.2}));
        assert!(matches!(result, Err(AppError::Schema(_))));
    }

    #[test]
    fn test_airing_flag_fallback() {
        let record =
            normalize_value(json!({"mal_id": 7, "title": "Ongoing", "status": "???", "airing": true}))
                .unwrap();
        assert_eq!(record.status, Some(AiringStatus::Airing));
    }

    #[test]
    fn test_mal_zero_episodes_is_unknown() {
        let record = normalize_value(json!({
            "node": {"id": 8, "title": "Fresh", "num_episodes": 0, "status": "currently_airing"}
        }))
        .unwrap();
        assert_eq!(record.episode_count, None);
        assert_eq!(record.status, Some(AiringStatus::Airing));
    }

    #[test]
    fn test_batch_skips_bad_items_and_duplicates() {
        let records = normalize_batch(vec![
            jikan_frieren(),
            json!({"title": "No Id"}),
            json!({"mal_id": 21, "title": "One Piece"}),
            mal_frieren(),
        ]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 52991);
        assert_eq!(records[1].id, 21);
    }
}
