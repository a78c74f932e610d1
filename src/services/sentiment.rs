//! Comment sentiment scoring.
//!
//! The default scorer is VADER: a rule-based analyzer whose lexicon and
//! heuristics (boosters, negation, capitalization, punctuation emphasis,
//! "but" clauses) are tuned for short social media text. The compound score
//! it reports is already normalized into [-1, 1].

use once_cell::sync::Lazy;
use vader_sentiment::SentimentIntensityAnalyzer;

/// Scores a block of text. Implementations must be deterministic, bounded to
/// [-1, 1], and return `0.0` for empty or whitespace-only input.
pub trait SentimentScorer: Send + Sync {
    fn score(&self, text: &str) -> f64;
}

/// Builds the lexicon once; every scorer shares it
static ANALYZER: Lazy<SentimentIntensityAnalyzer<'static>> = Lazy::new(SentimentIntensityAnalyzer::new);

/// VADER compound scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct VaderScorer;

impl VaderScorer {
    pub fn new() -> Self {
        Self
    }
}

impl SentimentScorer for VaderScorer {
    fn score(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }

        let compound = ANALYZER
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or(0.0);

        if compound.is_finite() {
            compound.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}
