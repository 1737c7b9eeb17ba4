mod recommendation;

pub use recommendation::{RankedList, RecommendationItem, RootFeed};
