//! Data models for search results and streaming offers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One way to watch a title: a provider, a link to it, and its price/quality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Streaming service, e.g. "Netflix"
    pub provider_name: String,
    /// Link to the title on the provider's site
    pub deep_link: String,
    /// Price or quality descriptor, e.g. "$3.99 HD"
    pub label: String,
}

impl Offer {
    pub fn new(
        provider_name: impl Into<String>,
        deep_link: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self { provider_name: provider_name.into(), deep_link: deep_link.into(), label: label.into() }
    }
}

/// One search result row: a film or show and its offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEntry {
    pub title: String,
    /// Four-digit release year, or empty when the page shows none
    pub year: String,
    /// Offers keyed by capitalized category ("Stream", "Rent", "Buy"), each
    /// list in page order. Empty when the title has no offers.
    pub offers_by_category: BTreeMap<String, Vec<Offer>>,
}

impl MediaEntry {
    /// Returns true if at least one offer exists.
    pub fn has_offers(&self) -> bool {
        self.offers_by_category.values().any(|offers| !offers.is_empty())
    }

    /// Total number of offers across all categories.
    pub fn offer_count(&self) -> usize {
        self.offers_by_category.values().map(Vec::len).sum()
    }

    /// Offers in one category, if present.
    pub fn offers(&self, category: &str) -> Option<&[Offer]> {
        self.offers_by_category.get(category).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_entry() -> MediaEntry {
        let mut offers_by_category = BTreeMap::new();
        offers_by_category.insert(
            "Stream".to_string(),
            vec![Offer::new("Netflix", "https://netflix.com/title/1", "HD")],
        );
        offers_by_category.insert(
            "Buy".to_string(),
            vec![
                Offer::new("Apple TV", "https://tv.apple.com/1", "$9.99 4K"),
                Offer::new("Google Play", "https://play.google.com/1", "$7.99 HD"),
            ],
        );
        MediaEntry { title: "Inception".to_string(), year: "2010".to_string(), offers_by_category }
    }

    #[test]
    fn test_offer_counts() {
        let entry = make_entry();
        assert!(entry.has_offers());
        assert_eq!(entry.offer_count(), 3);
        assert_eq!(entry.offers("Buy").unwrap().len(), 2);
        assert!(entry.offers("Rent").is_none());
    }

    #[test]
    fn test_no_offers() {
        let entry = MediaEntry {
            title: "Obscure".to_string(),
            year: String::new(),
            offers_by_category: BTreeMap::new(),
        };
        assert!(!entry.has_offers());
        assert_eq!(entry.offer_count(), 0);
    }

    #[test]
    fn test_entry_json_shape() {
        let json = serde_json::to_value(make_entry()).unwrap();
        assert_eq!(json["title"], "Inception");
        assert_eq!(json["year"], "2010");
        assert_eq!(json["offers_by_category"]["Stream"][0]["provider_name"], "Netflix");
        assert_eq!(json["offers_by_category"]["Buy"][1]["label"], "$7.99 HD");
    }

    #[test]
    fn test_empty_offers_serialize_as_empty_object() {
        let entry = MediaEntry {
            title: "Obscure".to_string(),
            year: String::new(),
            offers_by_category: BTreeMap::new(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"title":"Obscure","year":"","offers_by_category":{}}"#);
    }
}
