/// Social discussion gathered for one title
///
/// Built fresh per title by a discussion source and dropped once the hype
/// score has been computed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HypeSample {
    pub comment_texts: Vec<String>,
    /// Upvote-style weight of each comment, parallel to `comment_texts`
    pub comment_scores: Vec<i64>,
    /// Sum of the sampled threads' own scores
    pub aggregate_post_score: i64,
}

impl HypeSample {
    pub fn new(aggregate_post_score: i64) -> Self {
        Self {
            aggregate_post_score,
            ..Self::default()
        }
    }

    pub fn push_comment(&mut self, text: impl Into<String>, score: i64) {
        self.comment_texts.push(text.into());
        self.comment_scores.push(score);
    }

    pub fn comment_count(&self) -> usize {
        self.comment_texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comment_texts.is_empty()
    }
}
