use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{AnimeRecord, HypeMappingEntry, RatingRecord},
};

const RATING_MIN: f64 = 1.0;
const RATING_MAX: f64 = 10.0;

/// Hyper-parameters of the latent-factor model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub factors: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    pub regularization: f64,
    /// Standard deviation of the initial factor values
    pub init_std_dev: f64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            factors: 100,
            epochs: 20,
            learning_rate: 0.005,
            regularization: 0.1,
            init_std_dev: 0.1,
            seed: 42,
        }
    }
}

/// Biased matrix factorization: `mu + b_u + b_i + q_i . p_u`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatentFactorModel {
    pub config: TrainingConfig,
    pub global_mean: f64,
    /// User id -> row in `user_bias` / `user_factors`
    pub user_index: BTreeMap<u32, usize>,
    /// Anime id -> row in `item_bias` / `item_factors`
    pub item_index: BTreeMap<i64, usize>,
    pub user_bias: Vec<f64>,
    pub item_bias: Vec<f64>,
    pub user_factors: Vec<Vec<f64>>,
    pub item_factors: Vec<Vec<f64>>,
    pub trained_at: DateTime<Utc>,
}

impl LatentFactorModel {
    /// Estimated rating, clipped to the 1-10 scale
    ///
    /// Unknown users or titles fall back to whichever biases are known.
    pub fn predict(&self, user_id: u32, anime_id: i64) -> f64 {
        let user = self.user_index.get(&user_id).copied();
        let item = self.item_index.get(&anime_id).copied();

        let mut estimate = self.global_mean;
        if let Some(u) = user {
            estimate += self.user_bias[u];
        }
        if let Some(i) = item {
            estimate += self.item_bias[i];
        }
        if let (Some(u), Some(i)) = (user, item) {
            estimate += dot(&self.user_factors[u], &self.item_factors[i]);
        }

        estimate.clamp(RATING_MIN, RATING_MAX)
    }

    /// Root mean squared error of the model over a set of ratings
    pub fn rmse(&self, ratings: &[RatingRecord]) -> f64 {
        if ratings.is_empty() {
            return 0.0;
        }
        let sum: f64 = ratings
            .iter()
            .map(|r| {
                let err = f64::from(r.rating) - self.predict(r.user_id, r.anime_id);
                err * err
            })
            .sum();
        (sum / ratings.len() as f64).sqrt()
    }

    pub fn num_users(&self) -> usize {
        self.user_index.len()
    }

    pub fn num_items(&self) -> usize {
        self.item_index.len()
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn index_of<K: Ord + Copy>(index: &mut BTreeMap<K, usize>, key: K) -> usize {
    let next = index.len();
    *index.entry(key).or_insert(next)
}

/// Fits the model with stochastic gradient descent over the ratings in order
pub fn train(ratings: &[RatingRecord], config: &TrainingConfig) -> AppResult<LatentFactorModel> {
    if ratings.is_empty() {
        return Err(AppError::InvalidParameter(
            "Cannot train on an empty rating set".to_string(),
        ));
    }
    if config.factors == 0 {
        return Err(AppError::InvalidParameter(
            "factors must be at least 1".to_string(),
        ));
    }

    let init = Normal::new(0.0, config.init_std_dev).map_err(|e| {
        AppError::InvalidParameter(format!(
            "init_std_dev {} is not a valid standard deviation: {}",
            config.init_std_dev, e
        ))
    })?;

    let mut user_index = BTreeMap::new();
    let mut item_index = BTreeMap::new();
    let samples: Vec<(usize, usize, f64)> = ratings
        .iter()
        .map(|r| {
            (
                index_of(&mut user_index, r.user_id),
                index_of(&mut item_index, r.anime_id),
                f64::from(r.rating),
            )
        })
        .collect();

    let global_mean = samples.iter().map(|(_, _, r)| r).sum::<f64>() / samples.len() as f64;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut random_factors = |rows: usize| -> Vec<Vec<f64>> {
        (0..rows)
            .map(|_| (0..config.factors).map(|_| init.sample(&mut rng)).collect())
            .collect()
    };
    let mut user_factors = random_factors(user_index.len());
    let mut item_factors = random_factors(item_index.len());
    let mut user_bias = vec![0.0; user_index.len()];
    let mut item_bias = vec![0.0; item_index.len()];

    tracing::info!(
        ratings = samples.len(),
        users = user_index.len(),
        items = item_index.len(),
        factors = config.factors,
        epochs = config.epochs,
        "Training latent-factor model"
    );

    let lr = config.learning_rate;
    let reg = config.regularization;

    for epoch in 0..config.epochs {
        let mut squared_error = 0.0;

        for &(u, i, rating) in &samples {
            let estimate =
                global_mean + user_bias[u] + item_bias[i] + dot(&user_factors[u], &item_factors[i]);
            let err = rating - estimate;
            squared_error += err * err;

            user_bias[u] += lr * (err - reg * user_bias[u]);
            item_bias[i] += lr * (err - reg * item_bias[i]);

            for f in 0..config.factors {
                let puf = user_factors[u][f];
                let qif = item_factors[i][f];
                user_factors[u][f] += lr * (err * qif - reg * puf);
                item_factors[i][f] += lr * (err * puf - reg * qif);
            }
        }

        tracing::debug!(
            epoch = epoch + 1,
            rmse = (squared_error / samples.len() as f64).sqrt(),
            "Epoch complete"
        );
    }

    let model = LatentFactorModel {
        config: config.clone(),
        global_mean,
        user_index,
        item_index,
        user_bias,
        item_bias,
        user_factors,
        item_factors,
        trained_at: Utc::now(),
    };

    tracing::info!(rmse = model.rmse(ratings), "Model training complete");

    Ok(model)
}

/// Title metadata persisted next to the model, keyed by anime id
pub fn build_hype_mapping(records: &[AnimeRecord]) -> BTreeMap<i64, HypeMappingEntry> {
    records
        .iter()
        .map(|record| {
            (
                record.id,
                HypeMappingEntry {
                    mean_score: record.mean_score,
                    hype_score: record.hype_score,
                    title: record.title.clone(),
                    genres: record.genres_joined(),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> TrainingConfig {
        TrainingConfig {
            factors: 8,
            epochs: 30,
            ..TrainingConfig::default()
        }
    }

    fn ratings() -> Vec<RatingRecord> {
        let mut ratings = Vec::new();
        for user_id in 1..=12u32 {
            for anime_id in [10i64, 20, 30, 40] {
                // Title 10 is loved, title 40 is disliked
                let rating = match anime_id {
                    10 => 9,
                    20 => 7,
                    30 => 5,
                    _ => 2,
                };
                ratings.push(RatingRecord {
                    user_id,
                    anime_id,
                    rating,
                });
            }
        }
        ratings
    }

    #[test]
    fn test_empty_ratings_rejected() {
        let result = train(&[], &TrainingConfig::default());
        assert!(matches!(result, Err(AppError::InvalidParameter(_))));
    }

    #[test]
    fn test_zero_factors_rejected() {
        let config = TrainingConfig {
            factors: 0,
            ..TrainingConfig::default()
        };
        assert!(matches!(
            train(&ratings(), &config),
            Err(AppError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_model_indexes_all_users_and_items() {
        let model = train(&ratings(), &small_config()).unwrap();
        assert_eq!(model.num_users(), 12);
        assert_eq!(model.num_items(), 4);
        assert_eq!(model.user_factors.len(), 12);
        assert!(model.item_factors.iter().all(|f| f.len() == 8));
        assert!((model.global_mean - 5.75).abs() < 1e-12);
    }

    #[test]
    fn test_predictions_stay_on_scale_and_follow_item_bias() {
        let model = train(&ratings(), &small_config()).unwrap();

        for user_id in 0..=14u32 {
            for anime_id in [10i64, 20, 30, 40, 999] {
                let prediction = model.predict(user_id, anime_id);
                assert!((RATING_MIN..=RATING_MAX).contains(&prediction));
            }
        }

        assert!(model.predict(1, 10) > model.predict(1, 40));
    }

    #[test]
    fn test_unknown_pair_predicts_global_mean() {
        let model = train(&ratings(), &small_config()).unwrap();
        assert!((model.predict(9999, 9999) - model.global_mean).abs() < 1e-12);
    }

    #[test]
    fn test_training_is_deterministic_for_seed() {
        let first = train(&ratings(), &small_config()).unwrap();
        let second = train(&ratings(), &small_config()).unwrap();
        assert_eq!(first.user_factors, second.user_factors);
        assert_eq!(first.item_bias, second.item_bias);
    }

    #[test]
    fn test_training_reduces_error() {
        let data = ratings();
        let untrained = train(
            &data,
            &TrainingConfig {
                epochs: 0,
                ..small_config()
            },
        )
        .unwrap();
        let trained = train(&data, &small_config()).unwrap();
        assert!(trained.rmse(&data) < untrained.rmse(&data));
    }

    #[test]
    fn test_model_json_round_trip() {
        let model = train(&ratings(), &small_config()).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let restored: LatentFactorModel = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.item_index, model.item_index);
        assert!((restored.predict(3, 20) - model.predict(3, 20)).abs() < 1e-9);
    }

    #[test]
    fn test_build_hype_mapping() {
        let record = AnimeRecord {
            id: 52991,
            title: "Sousou no Frieren".to_string(),
            mean_score: Some(9.3),
            scored_by_count: None,
            genres: ["Adventure", "Drama"].iter().map(|g| g.to_string()).collect(),
            media_type: Some("tv".to_string()),
            episode_count: Some(28),
            status: None,
            popularity_proxy: None,
            hype_score: Some(0.42),
        };

        let mapping = build_hype_mapping(&[record]);
        let entry = &mapping[&52991];
        assert_eq!(entry.title, "Sousou no Frieren");
        assert_eq!(entry.genres, "Adventure, Drama");
        assert_eq!(entry.hype_score, Some(0.42));
    }
}
