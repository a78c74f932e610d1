use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{AnimeRecord, HypeSample},
    services::{providers::DiscussionSource, sentiment::SentimentScorer},
};

/// Weighting constants and pacing for the hype score
///
/// The defaults are the documented behavior of the pipeline; downstream
/// ratings depend on them numerically.
#[derive(Debug, Clone, PartialEq)]
pub struct HypeConfig {
    /// Below this aggregate thread score, a sample without comments scores exactly 0.0
    pub min_post_score: i64,
    pub sentiment_weight: f64,
    pub volume_weight: f64,
    /// Divisor applied to `log10(1 + volume)`
    pub volume_divisor: f64,
    /// Threads sampled per title
    pub max_threads: usize,
    /// Upper bound on one title's lookup
    pub lookup_timeout: Duration,
    /// Fixed wait before each title's lookup
    pub delay: Duration,
}

impl Default for HypeConfig {
    fn default() -> Self {
        Self {
            min_post_score: 10,
            sentiment_weight: 0.6,
            volume_weight: 0.4,
            volume_divisor: 5.0,
            max_threads: 5,
            lookup_timeout: Duration::from_secs(30),
            delay: Duration::from_secs(2),
        }
    }
}

impl HypeConfig {
    /// Default weights with pacing taken from the application config
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_threads: config.hype_max_threads,
            lookup_timeout: Duration::from_secs(config.hype_timeout_secs),
            delay: Duration::from_millis(config.hype_delay_ms),
            ..Self::default()
        }
    }

    /// Blends an average sentiment and a discussion volume into a score in [-1, 1]
    pub fn blend(&self, avg_sentiment: f64, total_volume: i64) -> f64 {
        let scaled_volume = (1.0 + total_volume.max(0) as f64).log10() / self.volume_divisor;
        let hype = self.sentiment_weight * avg_sentiment + self.volume_weight * scaled_volume;
        hype.clamp(-1.0, 1.0)
    }
}

/// Computes per-title hype scores from a discussion source
pub struct HypeAggregator {
    source: Arc<dyn DiscussionSource>,
    scorer: Arc<dyn SentimentScorer>,
    config: HypeConfig,
}

impl HypeAggregator {
    pub fn new(
        source: Arc<dyn DiscussionSource>,
        scorer: Arc<dyn SentimentScorer>,
        config: HypeConfig,
    ) -> Self {
        Self {
            source,
            scorer,
            config,
        }
    }

    pub fn config(&self) -> &HypeConfig {
        &self.config
    }

    /// Scores an already gathered sample
    ///
    /// 1. no comments and thread score below the threshold -> 0.0
    /// 2. mean comment sentiment
    /// 3. volume = comment count + aggregate thread score
    /// 4. `0.6 * sentiment + 0.4 * log10(1 + volume) / 5`, clamped to [-1, 1]
    pub fn compute_hype(&self, title: &str, sample: &HypeSample) -> f64 {
        if sample.is_empty() && sample.aggregate_post_score < self.config.min_post_score {
            tracing::debug!(title = %title, "Insufficient discussion signal");
            return 0.0;
        }

        let avg_sentiment = if sample.is_empty() {
            0.0
        } else {
            let total: f64 = sample
                .comment_texts
                .iter()
                .map(|text| self.scorer.score(text))
                .sum();
            total / sample.comment_count() as f64
        };

        let total_volume = sample.comment_count() as i64 + sample.aggregate_post_score;
        self.config.blend(avg_sentiment, total_volume)
    }

    async fn gather(&self, title: &str) -> AppResult<HypeSample> {
        tokio::time::timeout(
            self.config.lookup_timeout,
            self.source.fetch_sample(title, self.config.max_threads),
        )
        .await
        .map_err(|_| {
            AppError::UpstreamUnavailable(format!(
                "Hype lookup for '{}' timed out after {:?}",
                title, self.config.lookup_timeout
            ))
        })?
    }

    /// Gathers and scores one title; any failure yields a neutral 0.0
    pub async fn score_title(&self, title: &str) -> f64 {
        match self.gather(title).await {
            Ok(sample) => self.compute_hype(title, &sample),
            Err(e) => {
                tracing::warn!(
                    title = %title,
                    provider = self.source.name(),
                    error = %e,
                    "Hype lookup failed, using neutral score"
                );
                0.0
            }
        }
    }

    /// Scores every record in order, waiting the configured delay before each lookup
    ///
    /// Returns new records; the output order matches the input order.
    pub async fn enrich(&self, records: &[AnimeRecord]) -> Vec<AnimeRecord> {
        let total = records.len();
        let mut enriched = Vec::with_capacity(total);

        tracing::info!(
            titles = total,
            delay_ms = self.config.delay.as_millis() as u64,
            provider = self.source.name(),
            "Starting hype score calculation"
        );

        for (index, record) in records.iter().enumerate() {
            if !self.config.delay.is_zero() {
                tokio::time::sleep(self.config.delay).await;
            }

            let score = self.score_title(&record.title).await;
            tracing::info!(
                position = index + 1,
                total = total,
                title = %record.title,
                hype_score = score,
                "Hype score computed"
            );

            enriched.push(record.with_hype(score));
        }

        enriched
    }
}
