use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Deref;

/// One candidate recommendation as served by the feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationItem {
    /// URI of the row artwork
    #[serde(rename = "image")]
    pub image_ref: String,
    /// Natural key used for skip/owned exclusion
    pub title: String,
    pub tagline: String,
    pub rating: Option<f32>,
    pub is_released: bool,
}

impl RecommendationItem {
    /// Row text for the rating; an absent rating reads as 0.0
    pub fn rating_label(&self) -> String {
        format!("Rating: {:?}", self.rating.unwrap_or(0.0))
    }

    /// Parsed artwork URL, or `None` when the reference is not a valid URL
    pub fn image_url(&self) -> Option<Url> {
        Url::parse(&self.image_ref).ok()
    }
}

/// One snapshot of server truth, consumed once per fetch
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RootFeed {
    pub titles: Vec<RecommendationItem>,
    pub skipped: HashSet<String>,
    #[serde(rename = "titles_owned")]
    pub owned_titles: HashSet<String>,
}

/// Filtered, sorted, size-capped list shown to the user and persisted locally
///
/// Serialized as a bare JSON array of items. Never mutated in place; the
/// orchestrator swaps whole snapshots.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RankedList(Vec<RecommendationItem>);

impl RankedList {
    pub(crate) fn from_ranked(items: Vec<RecommendationItem>) -> Self {
        Self(items)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[RecommendationItem] {
        &self.0
    }

    pub fn titles(&self) -> Vec<&str> {
        self.0.iter().map(|item| item.title.as_str()).collect()
    }
}

impl Deref for RankedList {
    type Target = [RecommendationItem];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(title: &str, rating: Option<f32>) -> RecommendationItem {
        RecommendationItem {
            image_ref: format!("https://images.test/{}.png", title),
            title: title.to_string(),
            tagline: format!("{} tagline", title),
            rating,
            is_released: true,
        }
    }

    #[test]
    fn test_root_feed_wire_keys() {
        let raw = json!({
            "titles": [{
                "image": "https://images.test/x.png",
                "title": "X",
                "tagline": "An X story",
                "rating": 4.5,
                "is_released": true
            }, {
                "image": "https://images.test/y.png",
                "title": "Y",
                "tagline": "Why not",
                "rating": null,
                "is_released": false
            }],
            "skipped": ["A", "A"],
            "titles_owned": ["B"]
        });

        let root: RootFeed = serde_json::from_value(raw).unwrap();

        assert_eq!(root.titles.len(), 2);
        assert_eq!(root.titles[0].image_ref, "https://images.test/x.png");
        assert_eq!(root.titles[0].rating, Some(4.5));
        assert_eq!(root.titles[1].rating, None);
        assert!(!root.titles[1].is_released);
        assert_eq!(root.skipped.len(), 1);
        assert!(root.owned_titles.contains("B"));
    }

    #[test]
    fn test_root_feed_schema_mismatch() {
        let raw = json!({ "titles": [], "skipped": [] });
        assert!(serde_json::from_value::<RootFeed>(raw).is_err());
    }

    #[test]
    fn test_ranked_list_serializes_as_array() {
        let list = RankedList::from_ranked(vec![item("X", Some(4.5))]);
        let value = serde_json::to_value(&list).unwrap();

        assert_eq!(
            value,
            json!([{
                "image": "https://images.test/X.png",
                "title": "X",
                "tagline": "X tagline",
                "rating": 4.5,
                "is_released": true
            }])
        );

        let back: RankedList = serde_json::from_value(value).unwrap();
        assert_eq!(back, list);
    }

    #[test]
    fn test_rating_label() {
        assert_eq!(item("X", Some(4.5)).rating_label(), "Rating: 4.5");
        assert_eq!(item("Y", None).rating_label(), "Rating: 0.0");
        assert_eq!(item("Z", Some(9.0)).rating_label(), "Rating: 9.0");
    }

    #[test]
    fn test_image_url() {
        assert!(item("X", None).image_url().is_some());

        let mut broken = item("X", None);
        broken.image_ref = "not a url".to_string();
        assert!(broken.image_url().is_none());
    }
}
