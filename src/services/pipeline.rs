/// Stage orchestration
///
/// Each stage reads the previous stage's output from disk and writes its
/// own, so stages can be re-run independently:
///
/// collect -> raw_anime_data.csv -> hype -> processed_anime_data.csv
///   -> ratings -> synthetic_user_ratings.csv -> train -> models/*.json
use std::io;
use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::{AnimeRecord, RatingRecord},
    services::{
        hype::HypeAggregator,
        normalizer::normalize_batch,
        providers::MetadataSource,
        ratings::{self, RatingConfig},
        training::{self, build_hype_mapping, LatentFactorModel, TrainingConfig},
    },
    storage::{self, DataPaths},
};

fn require_input(path: &Path, producer: &str) -> AppResult<()> {
    if path.exists() {
        return Ok(());
    }
    Err(AppError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!(
            "Required file '{}' not found; run `{}` first",
            path.display(),
            producer
        ),
    )))
}

/// Fetches the top airing titles, normalizes them and writes the raw table
///
/// An unreachable source yields an empty catalog and no table is written.
pub async fn collect(
    source: &dyn MetadataSource,
    limit: usize,
    paths: &DataPaths,
) -> AppResult<Vec<AnimeRecord>> {
    let payloads = match source.fetch_top_anime(limit).await {
        Ok(payloads) => payloads,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            tracing::error!(provider = source.name(), error = %e, "Failed to fetch top anime");
            return Ok(Vec::new());
        }
    };

    let records = normalize_batch(payloads);
    if records.is_empty() {
        tracing::warn!(provider = source.name(), "No anime collected");
        return Ok(records);
    }

    storage::write_anime_table(&paths.raw_anime(), &records)?;
    Ok(records)
}

/// Attaches a hype score to every title of the raw table
pub async fn enrich(aggregator: &HypeAggregator, paths: &DataPaths) -> AppResult<Vec<AnimeRecord>> {
    let raw_path = paths.raw_anime();
    require_input(&raw_path, "collect")?;

    let records = storage::read_anime_table(&raw_path)?;
    let enriched = aggregator.enrich(&records).await;

    storage::write_anime_table(&paths.processed_anime(), &enriched)?;
    tracing::info!(titles = enriched.len(), "Hype analysis complete");
    Ok(enriched)
}

/// Simulates user ratings for the processed catalog
///
/// Titles without a community mean score cannot anchor a rating and are left out.
pub fn generate_ratings(config: &RatingConfig, paths: &DataPaths) -> AppResult<Vec<RatingRecord>> {
    let processed_path = paths.processed_anime();
    require_input(&processed_path, "hype")?;

    let records = storage::read_anime_table(&processed_path)?;
    let total = records.len();
    let rateable: Vec<AnimeRecord> = records
        .into_iter()
        .filter(|r| r.mean_score.is_some() && r.hype_score.is_some())
        .collect();

    if rateable.len() < total {
        tracing::warn!(
            skipped = total - rateable.len(),
            "Titles without a mean score or hype score left out of rating simulation"
        );
    }

    let ratings = ratings::generate(&rateable, config)?;
    storage::write_ratings(&paths.ratings(), &ratings)?;
    Ok(ratings)
}

/// Trains the latent-factor model and saves it with the title mapping
pub fn train_model(config: &TrainingConfig, paths: &DataPaths) -> AppResult<LatentFactorModel> {
    let ratings_path = paths.ratings();
    let processed_path = paths.processed_anime();
    require_input(&ratings_path, "ratings")?;
    require_input(&processed_path, "hype")?;

    let ratings = storage::read_ratings(&ratings_path)?;
    let records = storage::read_anime_table(&processed_path)?;

    let model = training::train(&ratings, config)?;
    storage::write_model(&paths.model(), &model)?;
    storage::write_hype_mapping(&paths.hype_mapping(), &build_hype_mapping(&records))?;

    Ok(model)
}
