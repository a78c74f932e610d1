pub mod anime;
pub mod hype;
pub mod payload;
pub mod rating;

pub use anime::{canonical_media_type, AiringStatus, AnimeRecord, GENRE_SEPARATOR};
pub use hype::HypeSample;
pub use payload::{GenreRef, JikanAnime, MalAnimeNode, MalRankingEntry, SourcePayload};
pub use rating::{HypeMappingEntry, RatingRecord};
