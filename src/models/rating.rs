use serde::{Deserialize, Serialize};

/// One synthetic user's rating of one title
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RatingRecord {
    pub user_id: u32,
    #[serde(rename = "mal_id")]
    pub anime_id: i64,
    /// Integer rating on the 1-10 scale
    pub rating: u8,
}

/// Lookup entry persisted next to the trained model, keyed by anime id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HypeMappingEntry {
    pub mean_score: Option<f64>,
    pub hype_score: Option<f64>,
    pub title: String,
    pub genres: String,
}
