// src/services/geocoder.rs
// DOCUMENTATION: Google Geocoding API adapter
// PURPOSE: Turn a free-text place name into coordinates plus a display name

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::services::ResponseCache;

/// A successful geocoding result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodedLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Formatted address returned by the geocoder
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: Option<String>,
    geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: GeocodeLocation,
}

#[derive(Debug, Deserialize)]
struct GeocodeLocation {
    lat: f64,
    lng: f64,
}

/// Geocoding adapter.
/// DOCUMENTATION: One interchangeable external geocoding service behind a
/// narrow "first match or not found" surface. Network errors, non-OK
/// statuses and empty result sets all collapse to None; the caller is
/// responsible for falling back to the configured default center.
pub struct GeocoderClient {
    client: Client,
    api_key: String,
    base_url: String,
    cache: Arc<ResponseCache>,
}

impl GeocoderClient {
    pub fn new(api_key: String, cache: Arc<ResponseCache>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://maps.googleapis.com/maps/api/geocode".to_string(),
            cache,
        }
    }

    /// Override the upstream base URL. Used by tests against a mock server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Geocode a free-text query, optionally biased to a region code.
    pub async fn geocode(&self, query: &str, region: Option<&str>) -> Option<GeocodedLocation> {
        let cache_key = ResponseCache::geocode_key(query);
        if let Some(cached) = self.cache.get(&cache_key).await {
            if let Ok(location) = serde_json::from_str::<GeocodedLocation>(&cached) {
                return Some(location);
            }
        }

        let url = format!("{}/json", self.base_url);
        let mut params = vec![
            ("address", query.to_string()),
            ("key", self.api_key.clone()),
        ];
        if let Some(region) = region {
            params.push(("region", region.to_string()));
        }

        log::debug!("Geocoding query: {}", query);

        let response = match self.client.get(&url).query(&params).send().await {
            Ok(resp) => resp,
            Err(e) => {
                log::warn!("Geocoding request failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            log::warn!("Geocoding API returned HTTP {}", response.status());
            return None;
        }

        let payload: GeocodeResponse = match response.json().await {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Failed to parse geocoding response: {}", e);
                return None;
            }
        };

        if payload.status != "OK" {
            log::info!("Geocoding returned status {} for '{}'", payload.status, query);
            return None;
        }

        // First match wins
        let first = payload.results.into_iter().next()?;
        let location = GeocodedLocation {
            latitude: first.geometry.location.lat,
            longitude: first.geometry.location.lng,
            display_name: first
                .formatted_address
                .unwrap_or_else(|| query.to_string()),
        };

        if let Ok(serialized) = serde_json::to_string(&location) {
            self.cache.set(cache_key, serialized).await;
        }

        Some(location)
    }
}
