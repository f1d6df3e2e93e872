// src/models/place.rs
// DOCUMENTATION: Core data structures for places
// PURPOSE: Defines the per-pass place record and the category vocabulary

use serde::{Deserialize, Serialize};

/// Pseudo-category expanded into keyword searches instead of a single
/// typed Nearby Search call.
pub const TRAINING_LIKE: &str = "training_like";

/// Category tokens accepted by the search surface, with display labels.
/// `training_like` is special-cased by the place adapter.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("school", "Schools"),
    ("university", "Universities"),
    ("secondary_school", "Secondary Schools"),
    ("primary_school", "Primary Schools"),
    ("library", "Libraries"),
];

/// Keyword fan-out used when the broad `training_like` category is
/// requested without an explicit keyword.
pub const TRAINING_KEYWORDS: &[&str] = &[
    "training center",
    "academy",
    "bootcamp",
    "coaching center",
    "institute",
    "skill development",
    "IELTS",
    "Data Science",
    "Python",
];

/// A venue/institution entry returned by the place-search service.
/// DOCUMENTATION: Ephemeral record, created per search pass and discarded
/// at the end of the render cycle. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceRecord {
    /// External identifier, unique per source. Used for deduplication
    /// within one aggregation pass (first occurrence wins).
    pub place_id: String,

    /// Display name
    pub name: String,

    /// Latitude, exactly as received from the source
    pub latitude: f64,

    /// Longitude, exactly as received from the source
    pub longitude: f64,

    /// Short address string (vicinity or formatted address)
    pub address: Option<String>,

    /// Rating (0-5)
    pub rating: Option<f32>,

    /// Number of user ratings
    pub review_count: Option<i32>,

    /// Whether the place is currently open, when the source says
    pub open_now: Option<bool>,

    /// Category token that produced this record
    pub category: String,

    /// Link to the place on the upstream map service
    pub maps_url: String,

    /// Website from the details lookup, when enrichment ran
    pub website: Option<String>,

    /// Auto-discovered event/admission page on the place website
    pub event_link: Option<String>,
}

impl PlaceRecord {
    /// Build the canonical upstream map link for a place identifier.
    pub fn maps_link(place_id: &str) -> String {
        format!("https://www.google.com/maps/place/?q=place_id:{}", place_id)
    }

    /// Human-readable open/closed label, empty when unknown.
    pub fn open_label(&self) -> &'static str {
        match self.open_now {
            Some(true) => "Open now",
            Some(false) => "Closed now",
            None => "",
        }
    }
}

/// Sort places by descending rating, ties broken by descending review
/// count. Remaining ties keep upstream order (stable sort).
pub fn sort_by_rating(places: &mut [PlaceRecord]) {
    places.sort_by(|a, b| {
        b.rating
            .unwrap_or(0.0)
            .total_cmp(&a.rating.unwrap_or(0.0))
            .then_with(|| b.review_count.unwrap_or(0).cmp(&a.review_count.unwrap_or(0)))
    });
}
