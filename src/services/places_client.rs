// src/services/places_client.rs
// DOCUMENTATION: Google Places Nearby Search adapter
// PURPOSE: Issue per-category nearby searches with pagination and merge
// results by place identifier

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::EdumapError;
use crate::models::{PlaceRecord, SearchRequest, TRAINING_KEYWORDS, TRAINING_LIKE};
use crate::services::ResponseCache;

/// Response from a Nearby Search page
#[derive(Debug, Deserialize, Serialize)]
pub struct NearbyResponse {
    #[serde(default)]
    pub results: Vec<NearbyPlace>,
    pub status: String,
    pub next_page_token: Option<String>,
    pub error_message: Option<String>,
}

/// Individual place from a Nearby Search page
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NearbyPlace {
    pub place_id: String,
    pub name: String,
    pub geometry: NearbyGeometry,
    /// Short address, as returned by Nearby Search
    pub vicinity: Option<String>,
    /// Detailed address, present on some responses
    pub formatted_address: Option<String>,
    pub rating: Option<f32>,
    pub user_ratings_total: Option<i32>,
    pub opening_hours: Option<NearbyOpeningHours>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NearbyGeometry {
    pub location: NearbyLocation,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NearbyLocation {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NearbyOpeningHours {
    pub open_now: Option<bool>,
}

/// Website/link fields from a Place Details lookup
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlaceDetails {
    pub name: Option<String>,
    pub website: Option<String>,
    pub url: Option<String>,
}

/// Outcome of one full nearby-search pass.
#[derive(Debug)]
pub struct NearbyOutcome {
    /// Merged records, upstream order preserved, duplicates dropped
    pub records: Vec<PlaceRecord>,
    /// Pages fetched across all calls
    pub api_calls: u32,
    /// Calls that failed and degraded to an empty contribution
    pub failed_calls: u32,
}

/// Nearby Search adapter
/// DOCUMENTATION: Handles authentication, pagination and identifier-based
/// merging for the place-search service.
pub struct PlacesClient {
    client: Client,
    api_key: String,
    base_url: String,
    cache: Arc<ResponseCache>,
    /// Wait between paginated calls; the upstream contract requires a
    /// pause before a next_page_token becomes valid.
    page_delay: Duration,
}

impl PlacesClient {
    pub fn new(api_key: String, cache: Arc<ResponseCache>, page_delay_ms: u64) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://maps.googleapis.com/maps/api/place".to_string(),
            cache,
            page_delay: Duration::from_millis(page_delay_ms),
        }
    }

    /// Override the upstream base URL. Used by tests against a mock server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Run the full per-category search for a resolved center.
    ///
    /// One call per category token; the broad `training_like` category
    /// instead fans out over the built-in keyword list (or the caller's
    /// keyword when given) against the generic `establishment` type.
    /// Records are merged by `place_id`: first occurrence wins, upstream
    /// order is preserved. A failed call degrades to an empty contribution
    /// for that call only.
    pub async fn search_nearby(
        &self,
        center: (f64, f64),
        request: &SearchRequest,
    ) -> NearbyOutcome {
        let mut seen: HashSet<String> = HashSet::new();
        let mut records: Vec<PlaceRecord> = Vec::new();
        let mut api_calls = 0;
        let mut failed_calls = 0;

        for category in &request.categories {
            if category == TRAINING_LIKE {
                let keywords: Vec<&str> = match &request.keyword {
                    Some(kw) => vec![kw.as_str()],
                    None => TRAINING_KEYWORDS.to_vec(),
                };

                for keyword in keywords {
                    match self
                        .collect_pages(
                            center,
                            request,
                            "establishment",
                            Some(keyword),
                            category,
                            &mut seen,
                            &mut records,
                        )
                        .await
                    {
                        Ok(pages) => api_calls += pages,
                        Err(e) => {
                            failed_calls += 1;
                            log::warn!(
                                "Nearby search failed for keyword '{}': {}",
                                keyword,
                                e
                            );
                        }
                    }
                }
            } else {
                match self
                    .collect_pages(
                        center,
                        request,
                        category,
                        request.keyword.as_deref(),
                        category,
                        &mut seen,
                        &mut records,
                    )
                    .await
                {
                    Ok(pages) => api_calls += pages,
                    Err(e) => {
                        failed_calls += 1;
                        log::warn!("Nearby search failed for category '{}': {}", category, e);
                    }
                }
            }
        }

        log::info!(
            "Nearby search merged {} places from {} pages ({} calls degraded)",
            records.len(),
            api_calls,
            failed_calls
        );

        NearbyOutcome {
            records,
            api_calls,
            failed_calls,
        }
    }

    /// Follow one search call through its continuation tokens, up to the
    /// request's page-depth limit. Returns the number of pages fetched.
    async fn collect_pages(
        &self,
        center: (f64, f64),
        request: &SearchRequest,
        place_type: &str,
        keyword: Option<&str>,
        category_tag: &str,
        seen: &mut HashSet<String>,
        records: &mut Vec<PlaceRecord>,
    ) -> Result<u32, EdumapError> {
        let mut page_token: Option<String> = None;
        let mut pages = 0u32;
        let mut retried_token = false;

        loop {
            let payload = self
                .fetch_page(center, request.radius_m, place_type, keyword, page_token.as_deref())
                .await?;

            match payload.status.as_str() {
                "OK" | "ZERO_RESULTS" => {}
                // A continuation token is issued before it becomes valid
                // upstream; wait once and retry the same page.
                "INVALID_REQUEST" if page_token.is_some() && !retried_token => {
                    retried_token = true;
                    tokio::time::sleep(self.page_delay).await;
                    continue;
                }
                "OVER_QUERY_LIMIT" => {
                    return Err(EdumapError::RateLimitExceeded);
                }
                other => {
                    let msg = payload
                        .error_message
                        .unwrap_or_else(|| format!("status {}", other));
                    return Err(EdumapError::ExternalApiError(msg));
                }
            }

            for raw in payload.results {
                // First occurrence wins; later duplicates are discarded.
                if seen.insert(raw.place_id.clone()) {
                    records.push(Self::to_record(raw, category_tag));
                }
            }

            pages += 1;
            retried_token = false;

            match payload.next_page_token {
                Some(token) if pages < request.max_pages => {
                    page_token = Some(token);
                    tokio::time::sleep(self.page_delay).await;
                }
                _ => break,
            }
        }

        Ok(pages)
    }

    /// Fetch one Nearby Search page.
    async fn fetch_page(
        &self,
        center: (f64, f64),
        radius_m: u32,
        place_type: &str,
        keyword: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<NearbyResponse, EdumapError> {
        let url = format!("{}/nearbysearch/json", self.base_url);

        let mut params = vec![
            ("location", format!("{},{}", center.0, center.1)),
            ("radius", radius_m.to_string()),
            ("type", place_type.to_string()),
            ("key", self.api_key.clone()),
        ];
        if let Some(kw) = keyword {
            params.push(("keyword", kw.to_string()));
        }
        if let Some(token) = page_token {
            params.push(("pagetoken", token.to_string()));
        }

        log::debug!(
            "Nearby search: type={}, keyword={:?}, paged={}",
            place_type,
            keyword,
            page_token.is_some()
        );

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| EdumapError::ExternalApiError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EdumapError::ExternalApiError(format!(
                "API error {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| EdumapError::ExternalApiError(format!("Parse error: {}", e)))
    }

    /// Look up website/link fields for a place, memoized by identifier.
    pub async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, EdumapError> {
        if place_id.is_empty() {
            return Ok(PlaceDetails::default());
        }

        let cache_key = ResponseCache::details_key(place_id);
        if let Some(cached) = self.cache.get(&cache_key).await {
            if let Ok(details) = serde_json::from_str::<PlaceDetails>(&cached) {
                return Ok(details);
            }
        }

        let url = format!("{}/details/json", self.base_url);
        let params = [
            ("place_id", place_id),
            ("fields", "name,website,url"),
            ("key", &self.api_key),
        ];

        log::debug!("Place details lookup: place_id={}", place_id);

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| EdumapError::ExternalApiError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(EdumapError::ExternalApiError(
                "Details request failed".to_string(),
            ));
        }

        #[derive(Deserialize)]
        struct DetailsResponse {
            result: Option<PlaceDetails>,
            status: String,
        }

        let payload: DetailsResponse = response
            .json()
            .await
            .map_err(|e| EdumapError::ExternalApiError(format!("Parse error: {}", e)))?;

        if payload.status != "OK" {
            return Err(EdumapError::ExternalApiError(format!(
                "Details status: {}",
                payload.status
            )));
        }

        let details = payload.result.unwrap_or_default();
        if let Ok(serialized) = serde_json::to_string(&details) {
            self.cache.set(cache_key, serialized).await;
        }

        Ok(details)
    }

    /// Map a raw upstream place to the internal record. Coordinates and
    /// name are copied exactly as received.
    fn to_record(raw: NearbyPlace, category_tag: &str) -> PlaceRecord {
        PlaceRecord {
            maps_url: PlaceRecord::maps_link(&raw.place_id),
            name: raw.name,
            latitude: raw.geometry.location.lat,
            longitude: raw.geometry.location.lng,
            address: raw.vicinity.or(raw.formatted_address),
            rating: raw.rating,
            review_count: raw.user_ratings_total,
            open_now: raw.opening_hours.and_then(|h| h.open_now),
            category: category_tag.to_string(),
            website: None,
            event_link: None,
            place_id: raw.place_id,
        }
    }
}
