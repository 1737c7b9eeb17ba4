pub mod cache;

pub use cache::{FileStore, RecommendationStore};

#[cfg(test)]
pub use cache::MockRecommendationStore;
