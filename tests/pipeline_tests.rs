use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

use anime_hype::{
    error::{AppError, AppResult},
    models::HypeSample,
    services::{
        hype::{HypeAggregator, HypeConfig},
        pipeline,
        providers::{DiscussionSource, MetadataSource},
        ratings::RatingConfig,
        sentiment::VaderScorer,
        training::TrainingConfig,
    },
    storage::{self, DataPaths},
};

/// Serves a fixed catalog mixing both upstream payload shapes
struct FixtureCatalog;

#[async_trait::async_trait]
impl MetadataSource for FixtureCatalog {
    async fn fetch_top_anime(&self, limit: usize) -> AppResult<Vec<Value>> {
        let payloads = (0..40i64).map(|i| {
            if i % 2 == 0 {
                json!({
                    "mal_id": 1000 + i,
                    "title": format!("Jikan Show {}", i),
                    "score": 6.0 + (i % 4) as f64,
                    "scored_by": 1000 * i,
                    "genres": [{"name": "Action"}, {"name": "Drama"}],
                    "type": "TV",
                    "episodes": 12,
                    "status": "Currently Airing",
                    "members": 50_000 + i
                })
            } else {
                json!({
                    "node": {
                        "id": 1000 + i,
                        "title": format!("MAL Show {}", i),
                        "mean": 7.0 + (i % 3) as f64,
                        "num_scoring_users": 800 * i,
                        "genres": [{"id": 1, "name": "Comedy"}],
                        "media_type": "tv",
                        "num_episodes": 0,
                        "status": "currently_airing",
                        "num_list_users": 20_000 + i
                    }
                })
            }
        });
        Ok(payloads.take(limit).collect())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

/// Enthusiastic threads for Jikan titles, nothing for MAL titles, and an outage for one title
struct FixtureDiscussion;

#[async_trait::async_trait]
impl DiscussionSource for FixtureDiscussion {
    async fn fetch_sample(&self, title: &str, _max_threads: usize) -> AppResult<HypeSample> {
        if title == "Jikan Show 4" {
            return Err(AppError::UpstreamUnavailable("rate limited".to_string()));
        }
        let mut sample = HypeSample::new(0);
        if title.starts_with("Jikan") {
            sample = HypeSample::new(900);
            sample.push_comment("This episode was amazing, the animation is great!", 40);
            sample.push_comment("Honestly the best show of the season, I love it", 25);
        }
        Ok(sample)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

fn scratch_paths() -> (PathBuf, DataPaths) {
    let root = std::env::temp_dir().join(format!("anime-hype-it-{}", uuid::Uuid::new_v4()));
    let paths = DataPaths::new(root.join("data"), root.join("models"));
    (root, paths)
}

fn aggregator() -> HypeAggregator {
    HypeAggregator::new(
        Arc::new(FixtureDiscussion),
        Arc::new(VaderScorer::new()),
        HypeConfig {
            delay: Duration::ZERO,
            lookup_timeout: Duration::from_secs(5),
            ..HypeConfig::default()
        },
    )
}

#[tokio::test]
async fn test_full_pipeline_produces_artifacts() {
    let (root, paths) = scratch_paths();

    let collected = assert_ok!(pipeline::collect(&FixtureCatalog, 40, &paths).await);
    assert_eq!(collected.len(), 40);
    assert!(collected.iter().all(|r| r.hype_score.is_none()));

    let enriched = assert_ok!(pipeline::enrich(&aggregator(), &paths).await);
    assert_eq!(enriched.len(), 40);
    let input_ids: Vec<i64> = collected.iter().map(|r| r.id).collect();
    let output_ids: Vec<i64> = enriched.iter().map(|r| r.id).collect();
    assert_eq!(input_ids, output_ids);

    for record in &enriched {
        let hype = record.hype_score.unwrap();
        assert!((-1.0..=1.0).contains(&hype));
        if record.title.starts_with("MAL") || record.title == "Jikan Show 4" {
            assert_eq!(hype, 0.0, "{}", record.title);
        } else {
            assert!(hype > 0.0, "{}", record.title);
        }
    }

    let rating_config = RatingConfig {
        num_users: 30,
        min_ratings: 2,
        seed: Some(7),
        ..RatingConfig::default()
    };
    let ratings = assert_ok!(pipeline::generate_ratings(&rating_config, &paths));
    let catalog: HashSet<i64> = input_ids.iter().copied().collect();
    assert!(ratings.iter().all(|r| catalog.contains(&r.anime_id)));
    assert!(ratings.iter().all(|r| (1..=10).contains(&r.rating)));

    let training_config = TrainingConfig {
        factors: 10,
        epochs: 5,
        ..TrainingConfig::default()
    };
    let model = assert_ok!(pipeline::train_model(&training_config, &paths));
    for rating in ratings.iter().take(20) {
        let prediction = model.predict(rating.user_id, rating.anime_id);
        assert!((1.0..=10.0).contains(&prediction));
    }

    let restored = assert_ok!(storage::read_model(&paths.model()));
    assert_eq!(restored.item_index, model.item_index);

    let mapping = assert_ok!(storage::read_hype_mapping(&paths.hype_mapping()));
    assert_eq!(mapping.len(), 40);
    assert_eq!(mapping[&1000].genres, "Action, Drama");
    assert_eq!(mapping[&1001].title, "MAL Show 1");

    std::fs::remove_dir_all(root).unwrap();
}

#[tokio::test]
async fn test_mal_zero_episodes_survive_round_trip_as_unknown() {
    let (root, paths) = scratch_paths();

    assert_ok!(pipeline::collect(&FixtureCatalog, 2, &paths).await);
    let stored = assert_ok!(storage::read_anime_table(&paths.raw_anime()));

    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].episode_count, Some(12));
    assert_eq!(stored[1].episode_count, None);
    assert_eq!(stored[1].popularity_proxy, Some(20_001));

    std::fs::remove_dir_all(root).unwrap();
}

#[tokio::test]
async fn test_enrich_without_collected_catalog_fails() {
    let (_root, paths) = scratch_paths();
    assert_err!(pipeline::enrich(&aggregator(), &paths).await);
}

#[test]
fn test_ratings_reject_undersized_catalog() {
    let (root, paths) = scratch_paths();
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime
        .block_on(pipeline::collect(&FixtureCatalog, 6, &paths))
        .unwrap();
    runtime
        .block_on(pipeline::enrich(&aggregator(), &paths))
        .unwrap();

    // 15% of 6 titles is below one rating per user
    let result = pipeline::generate_ratings(&RatingConfig::default(), &paths);
    assert!(matches!(result, Err(AppError::InvalidParameter(_))));

    std::fs::remove_dir_all(root).unwrap();
}
