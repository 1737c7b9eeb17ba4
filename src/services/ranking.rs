use crate::models::{RankedList, RecommendationItem, RootFeed};

/// Maximum number of items kept in a ranked list
pub const MAX_RANKED_ITEMS: usize = 10;

/// Comparison value substituted for a missing rating
pub const MISSING_RATING: f32 = 0.0;

/// Derives the top-N display list from a feed snapshot
///
/// Keeps released titles that are neither skipped nor owned, orders them by
/// rating descending and truncates to [`MAX_RANKED_ITEMS`]. The sort is stable,
/// so equally rated titles keep their feed order. Pure: the same feed always
/// yields the same list.
pub fn rank(root: &RootFeed) -> RankedList {
    let mut candidates: Vec<RecommendationItem> = root
        .titles
        .iter()
        .filter(|item| item.is_released)
        .filter(|item| !root.skipped.contains(&item.title))
        .filter(|item| !root.owned_titles.contains(&item.title))
        .cloned()
        .collect();

    candidates.sort_by(|a, b| sort_key(b).total_cmp(&sort_key(a)));
    candidates.truncate(MAX_RANKED_ITEMS);

    RankedList::from_ranked(candidates)
}

/// Rating used for ordering only; the item keeps its original value
///
/// Missing and NaN ratings both compare as [`MISSING_RATING`]. Adding 0.0
/// folds -0.0 into +0.0 so `total_cmp` treats them as equal.
fn sort_key(item: &RecommendationItem) -> f32 {
    item.rating
        .filter(|rating| !rating.is_nan())
        .unwrap_or(MISSING_RATING)
        + 0.0
}
