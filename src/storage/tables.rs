/// CSV tables exchanged between pipeline stages
///
/// Anime tables keep one row per title with genres joined by `GENRE_SEPARATOR`; the
/// rating table has the columns `user_id,mal_id,rating`.
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{AiringStatus, AnimeRecord, RatingRecord, GENRE_SEPARATOR},
    storage::ensure_parent,
};

/// Flat, spreadsheet-friendly shape of an `AnimeRecord`
#[derive(Debug, Serialize, Deserialize)]
struct AnimeRow {
    mal_id: i64,
    title: String,
    score: Option<f64>,
    scored_by: Option<u64>,
    genres: String,
    #[serde(rename = "type")]
    media_type: Option<String>,
    episodes: Option<u32>,
    status: Option<String>,
    popularity: Option<u64>,
    hype_score: Option<f64>,
}

impl From<&AnimeRecord> for AnimeRow {
    fn from(record: &AnimeRecord) -> Self {
        Self {
            mal_id: record.id,
            title: record.title.clone(),
            score: record.mean_score,
            scored_by: record.scored_by_count,
            genres: record.genres_joined(),
            media_type: record.media_type.clone(),
            episodes: record.episode_count,
            status: record.status.map(|s| s.as_str().to_string()),
            popularity: record.popularity_proxy,
            hype_score: record.hype_score,
        }
    }
}

impl TryFrom<AnimeRow> for AnimeRecord {
    type Error = AppError;

    fn try_from(row: AnimeRow) -> AppResult<Self> {
        let status = match row.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(AiringStatus::parse(raw).ok_or_else(|| {
                AppError::Schema(format!("Unknown status '{}' for anime {}", raw, row.mal_id))
            })?),
        };

        Ok(AnimeRecord {
            id: row.mal_id,
            title: row.title,
            mean_score: row.score,
            scored_by_count: row.scored_by,
            genres: row
                .genres
                // tolerate hand-edited cells missing the space
                .split(GENRE_SEPARATOR.trim_end())
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect(),
            media_type: row.media_type.filter(|t| !t.is_empty()),
            episode_count: row.episodes,
            status,
            popularity_proxy: row.popularity,
            hype_score: row.hype_score,
        })
    }
}

pub fn write_anime_table(path: &Path, records: &[AnimeRecord]) -> AppResult<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;

    for record in records {
        writer.serialize(AnimeRow::from(record))?;
    }
    writer.flush()?;

    tracing::info!(path = %path.display(), rows = records.len(), "Anime table written");
    Ok(())
}

pub fn read_anime_table(path: &Path) -> AppResult<Vec<AnimeRecord>> {
    let mut reader = csv::Reader::from_path(path)?;

    let records = reader
        .deserialize::<AnimeRow>()
        .map(|row| AnimeRecord::try_from(row?))
        .collect::<AppResult<Vec<_>>>()?;

    tracing::debug!(path = %path.display(), rows = records.len(), "Anime table read");
    Ok(records)
}

pub fn write_ratings(path: &Path, ratings: &[RatingRecord]) -> AppResult<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;

    for rating in ratings {
        writer.serialize(rating)?;
    }
    writer.flush()?;

    tracing::info!(path = %path.display(), rows = ratings.len(), "Rating table written");
    Ok(())
}

pub fn read_ratings(path: &Path) -> AppResult<Vec<RatingRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let ratings = reader
        .deserialize::<RatingRecord>()
        .collect::<Result<Vec<_>, csv::Error>>()?;

    Ok(ratings)
}
