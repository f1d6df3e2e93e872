// src/models/search.rs
// DOCUMENTATION: Search request shapes
// PURPOSE: HTTP query DTO plus the resolved, request-scoped configuration
// passed through the adapter chain (no ambient mutable state)

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::EdumapError;
use crate::models::place::{CATEGORIES, TRAINING_LIKE};

/// Categories searched when the caller does not pick any.
const DEFAULT_CATEGORIES: &[&str] = &["training_like", "school", "university"];

/// Query parameters for GET /search
/// DOCUMENTATION: Data transfer object for the search endpoints.
/// Either `q` (free-text location) or `lat`+`lng` selects the center;
/// with neither, the configured default center is used.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SearchQuery {
    /// Free-text location to geocode (address or city)
    pub q: Option<String>,

    /// Explicit center latitude (device geolocation path)
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,

    /// Explicit center longitude
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: Option<f64>,

    /// Search radius in kilometers (1-30, default 5)
    #[validate(range(min = 1, max = 30))]
    pub radius_km: Option<u32>,

    /// Comma-separated category tokens, default "training_like,school,university"
    pub categories: Option<String>,

    /// Extra keyword applied to every place search call
    pub keyword: Option<String>,

    /// Pagination depth per search call (1-3, default 2)
    #[validate(range(min = 1, max = 3))]
    pub max_pages: Option<u32>,

    /// Attempt to auto-discover event/admission links on place websites.
    /// Adds one details call plus one site fetch per place.
    pub find_event_links: Option<bool>,
}

/// Immutable request-scoped search configuration.
/// DOCUMENTATION: Built once per request from the validated query and the
/// service config, then passed down the adapter chain unchanged.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Free-text location still to be geocoded, when no explicit center
    pub location_query: Option<String>,

    /// Explicit center, when the caller supplied coordinates
    pub center: Option<(f64, f64)>,

    /// Search radius in meters
    pub radius_m: u32,

    /// Category tokens to search, in request order
    pub categories: Vec<String>,

    /// Optional extra keyword
    pub keyword: Option<String>,

    /// Pagination depth limit per call
    pub max_pages: u32,

    /// Whether to run the website event-link discovery pass
    pub find_event_links: bool,
}

impl SearchRequest {
    /// Resolve a validated query into the request-scoped configuration.
    pub fn from_query(query: &SearchQuery) -> Result<Self, EdumapError> {
        let center = match (query.lat, query.lng) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            (None, None) => None,
            _ => {
                return Err(EdumapError::InvalidInput(
                    "lat and lng must be supplied together".to_string(),
                ))
            }
        };

        let categories: Vec<String> = match &query.categories {
            Some(raw) => raw
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            None => DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
        };
        if categories.is_empty() {
            return Err(EdumapError::InvalidInput(
                "at least one category is required".to_string(),
            ));
        }
        for token in &categories {
            let known =
                token == TRAINING_LIKE || CATEGORIES.iter().any(|(t, _)| t == token);
            if !known {
                return Err(EdumapError::InvalidInput(format!(
                    "unknown category '{}'",
                    token
                )));
            }
        }

        let keyword = query
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        let location_query = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);

        Ok(SearchRequest {
            location_query,
            center,
            radius_m: query.radius_km.unwrap_or(5) * 1000,
            categories,
            keyword,
            max_pages: query.max_pages.unwrap_or(2),
            find_event_links: query.find_event_links.unwrap_or(false),
        })
    }
}

/// The resolved map center for one pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedCenter {
    pub latitude: f64,
    pub longitude: f64,
    /// Display name from the geocoder, or a fallback label
    pub label: String,
    /// True when geocoding failed and the configured default was used
    pub is_fallback: bool,
}
