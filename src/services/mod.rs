pub mod hype;
pub mod normalizer;
pub mod pipeline;
pub mod providers;
pub mod ratings;
pub mod sentiment;
pub mod training;
