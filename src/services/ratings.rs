use std::collections::HashSet;

use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{AnimeRecord, RatingRecord},
};

/// Share of the catalog a single synthetic user rates at most (exclusive)
pub const MAX_CATALOG_SHARE: f64 = 0.15;
/// Weight of the community mean score in a simulated rating
pub const SCORE_WEIGHT: f64 = 0.6;
/// Weight of the rescaled hype score in a simulated rating
pub const HYPE_WEIGHT: f64 = 0.4;

/// Parameters of the synthetic rating generator
#[derive(Debug, Clone, PartialEq)]
pub struct RatingConfig {
    pub num_users: u32,
    pub min_ratings: usize,
    /// Seed for both item sampling and taste noise; entropy when absent
    pub seed: Option<u64>,
    /// Standard deviation of the per-rating taste noise
    pub noise_std_dev: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            num_users: 200,
            min_ratings: 5,
            seed: None,
            noise_std_dev: 1.5,
        }
    }
}

impl RatingConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            num_users: config.num_users,
            min_ratings: config.min_ratings,
            seed: config.rating_seed,
            ..Self::default()
        }
    }
}

/// Exclusive upper bound on how many titles one user rates
fn ratings_upper_bound(catalog_size: usize) -> f64 {
    catalog_size as f64 * MAX_CATALOG_SHARE
}

/// Blend of mean score and hype on [0, 1], before noise
pub fn base_rating(mean_score: f64, hype_score: f64) -> f64 {
    SCORE_WEIGHT * (mean_score / 10.0) + HYPE_WEIGHT * ((hype_score + 1.0) / 2.0)
}

/// Converts a base blend plus noise into an integer rating on the 1-10 scale
///
/// Halves round to the nearest even integer.
pub fn to_rating(base: f64, noise: f64) -> u8 {
    (base * 10.0 + noise).round_ties_even().clamp(1.0, 10.0) as u8
}

struct CatalogEntry {
    id: i64,
    base: f64,
}

fn validate(records: &[AnimeRecord], config: &RatingConfig) -> AppResult<Vec<CatalogEntry>> {
    if config.num_users == 0 {
        return Err(AppError::InvalidParameter(
            "num_users must be at least 1".to_string(),
        ));
    }
    if config.min_ratings == 0 {
        return Err(AppError::InvalidParameter(
            "min_ratings must be at least 1".to_string(),
        ));
    }

    let upper = ratings_upper_bound(records.len());
    if config.min_ratings as f64 >= upper {
        return Err(AppError::InvalidParameter(format!(
            "min_ratings ({}) must be below {:.2} ({}% of a {}-title catalog)",
            config.min_ratings,
            upper,
            MAX_CATALOG_SHARE * 100.0,
            records.len()
        )));
    }

    let mut seen = HashSet::with_capacity(records.len());
    records
        .iter()
        .map(|record| {
            if !seen.insert(record.id) {
                return Err(AppError::InvalidParameter(format!(
                    "Anime id {} appears more than once",
                    record.id
                )));
            }
            match (record.mean_score, record.hype_score) {
                (Some(mean_score), Some(hype_score)) => Ok(CatalogEntry {
                    id: record.id,
                    base: base_rating(mean_score, hype_score),
                }),
                _ => Err(AppError::InvalidParameter(format!(
                    "Anime {} ('{}') needs both a mean score and a hype score",
                    record.id, record.title
                ))),
            }
        })
        .collect()
}

/// Simulates user ratings from each title's mean score and hype
///
/// Every user rates between `min_ratings` and 15% of the catalog, drawn
/// without replacement, so no user rates the same title twice. All
/// parameters are checked before any rating is produced.
pub fn generate(records: &[AnimeRecord], config: &RatingConfig) -> AppResult<Vec<RatingRecord>> {
    let catalog = validate(records, config)?;

    let noise = Normal::new(0.0, config.noise_std_dev).map_err(|e| {
        AppError::InvalidParameter(format!(
            "noise_std_dev {} is not a valid standard deviation: {}",
            config.noise_std_dev, e
        ))
    })?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    // Integers strictly below 15% of the catalog
    let max_exclusive = ratings_upper_bound(catalog.len()).ceil() as usize;

    tracing::info!(
        users = config.num_users,
        catalog = catalog.len(),
        min_ratings = config.min_ratings,
        max_ratings = max_exclusive - 1,
        seeded = config.seed.is_some(),
        "Generating synthetic ratings"
    );

    let mut ratings = Vec::new();
    for user_id in 1..=config.num_users {
        let count = rng.gen_range(config.min_ratings..max_exclusive);

        for position in index::sample(&mut rng, catalog.len(), count) {
            let entry = &catalog[position];
            ratings.push(RatingRecord {
                user_id,
                anime_id: entry.id,
                rating: to_rating(entry.base, noise.sample(&mut rng)),
            });
        }
    }

    tracing::info!(ratings = ratings.len(), "Synthetic ratings generated");

    Ok(ratings)
}
