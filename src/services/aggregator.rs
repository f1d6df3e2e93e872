// src/services/aggregator.rs
// DOCUMENTATION: Multi-source aggregation pass
// PURPOSE: Orchestrate geocoding, place search, event collection and marker
// projection for one request

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::errors::EdumapError;
use crate::models::{
    to_feature_collection, EventRecord, Marker, PlaceRecord, ResolvedCenter, SearchRequest,
    sort_by_rating,
};
use crate::services::{
    EventsFile, GeocoderClient, LinkFinder, PlacesClient, ResponseCache, TicketingClient,
};

/// Cap on link enrichment per pass. The places are already rating-sorted,
/// so enrichment covers the entries a reader sees first.
pub const MAX_ENRICHED_PLACES: usize = 20;

/// Aggregation pass statistics
/// DOCUMENTATION: Tracks the results of one search-and-aggregate pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchStats {
    /// Place API pages fetched
    pub place_api_calls: u32,
    /// Upstream calls that failed and degraded to empty contributions
    pub degraded_calls: u32,
    /// Place-details lookups performed for link discovery
    pub detail_lookups: u32,
    /// Whether the configured default center was used
    pub used_default_center: bool,
    /// Places after identifier deduplication
    pub places_found: usize,
    /// Events across all sources
    pub events_found: usize,
    /// Total pass duration in milliseconds
    pub duration_ms: u64,
    /// Timestamp when the pass started
    pub started_at: String,
}

/// Result of one full aggregation pass, ready for rendering.
#[derive(Debug, Serialize)]
pub struct SearchOutcome {
    pub center: ResolvedCenter,
    /// Deduplicated places, sorted by rating then review count
    pub places: Vec<PlaceRecord>,
    /// Events from all sources, order per source contract
    pub events: Vec<EventRecord>,
    pub place_markers: Vec<Marker>,
    pub event_markers: Vec<Marker>,
    pub stats: SearchStats,
}

impl SearchOutcome {
    /// All markers as one GeoJSON FeatureCollection.
    pub fn to_geojson(&self) -> geojson::FeatureCollection {
        let mut markers = self.place_markers.clone();
        markers.extend(self.event_markers.iter().cloned());
        to_feature_collection(&markers)
    }
}

/// Aggregation service
/// DOCUMENTATION: Owns the upstream adapters and runs the synchronous
/// search-and-render sequence: one pass per request, no shared mutable
/// state between passes.
pub struct Aggregator {
    geocoder: GeocoderClient,
    places: PlacesClient,
    ticketing: Option<TicketingClient>,
    events_file: EventsFile,
    link_finder: LinkFinder,
    default_center: (f64, f64),
}

impl Aggregator {
    pub fn new(
        geocoder: GeocoderClient,
        places: PlacesClient,
        ticketing: Option<TicketingClient>,
        events_file: EventsFile,
        link_finder: LinkFinder,
        default_center: (f64, f64),
    ) -> Self {
        Self {
            geocoder,
            places,
            ticketing,
            events_file,
            link_finder,
            default_center,
        }
    }

    /// Wire up all adapters from the service configuration.
    pub fn from_config(config: &Config, cache: Arc<ResponseCache>) -> Self {
        let ticketing = if config.ticketing_api_key.is_empty() {
            None
        } else {
            Some(TicketingClient::new(config.ticketing_api_key.clone()))
        };

        Self::new(
            GeocoderClient::new(config.google_maps_api_key.clone(), cache.clone()),
            PlacesClient::new(
                config.google_maps_api_key.clone(),
                cache.clone(),
                config.page_delay_ms,
            ),
            ticketing,
            EventsFile::new(config.events_file.clone()),
            LinkFinder::new(cache),
            (config.default_lat, config.default_lng),
        )
    }

    /// Run one aggregation pass.
    ///
    /// Empty upstream responses across the board produce empty result
    /// lists, never an error; only invalid requests fail.
    pub async fn run(&self, request: &SearchRequest) -> Result<SearchOutcome, EdumapError> {
        let start_time = Instant::now();
        let mut stats = SearchStats {
            place_api_calls: 0,
            degraded_calls: 0,
            detail_lookups: 0,
            used_default_center: false,
            places_found: 0,
            events_found: 0,
            duration_ms: 0,
            started_at: Utc::now().to_rfc3339(),
        };

        // 1. Resolve the map center
        let center = self.resolve_center(request, &mut stats).await;
        let center_point = (center.latitude, center.longitude);

        // 2. Place search across categories, merged by identifier
        let nearby = self.places.search_nearby(center_point, request).await;
        stats.place_api_calls = nearby.api_calls;
        stats.degraded_calls += nearby.failed_calls;

        let mut places = nearby.records;
        sort_by_rating(&mut places);

        // 3. Optional event-link discovery on place websites
        if request.find_event_links {
            self.discover_event_links(&mut places, &mut stats).await;
        }

        // 4. Event sources
        let events = self.collect_events(request).await;

        // 5. Marker projection
        let place_markers: Vec<Marker> = places.iter().map(Marker::from_place).collect();
        let event_markers: Vec<Marker> = events.iter().filter_map(Marker::from_event).collect();

        stats.places_found = places.len();
        stats.events_found = events.len();
        stats.duration_ms = start_time.elapsed().as_millis() as u64;

        log::info!(
            "Aggregation pass: {} places, {} events ({} degraded calls, {} ms)",
            stats.places_found,
            stats.events_found,
            stats.degraded_calls,
            stats.duration_ms
        );

        Ok(SearchOutcome {
            center,
            places,
            events,
            place_markers,
            event_markers,
            stats,
        })
    }

    /// Pick the map center: explicit coordinates, then geocoded query,
    /// then the configured default.
    async fn resolve_center(
        &self,
        request: &SearchRequest,
        stats: &mut SearchStats,
    ) -> ResolvedCenter {
        if let Some((lat, lng)) = request.center {
            return ResolvedCenter {
                latitude: lat,
                longitude: lng,
                label: format!("{:.5}, {:.5}", lat, lng),
                is_fallback: false,
            };
        }

        if let Some(query) = &request.location_query {
            if let Some(location) = self.geocoder.geocode(query, None).await {
                return ResolvedCenter {
                    latitude: location.latitude,
                    longitude: location.longitude,
                    label: location.display_name,
                    is_fallback: false,
                };
            }
            log::warn!("Geocoding found nothing for '{}', using default center", query);
        }

        stats.used_default_center = true;
        ResolvedCenter {
            latitude: self.default_center.0,
            longitude: self.default_center.1,
            label: "Default center".to_string(),
            is_fallback: true,
        }
    }

    /// Enrich sorted places with auto-discovered event/admission links.
    /// Details lookup first (website field), then the homepage scan; both
    /// memoized, both best-effort. Only the first `MAX_ENRICHED_PLACES`
    /// entries are visited, so a large result set cannot burst-fetch an
    /// unbounded number of details calls and third-party sites.
    async fn discover_event_links(&self, places: &mut [PlaceRecord], stats: &mut SearchStats) {
        for place in places.iter_mut().take(MAX_ENRICHED_PLACES) {
            stats.detail_lookups += 1;

            let details = match self.places.place_details(&place.place_id).await {
                Ok(details) => details,
                Err(e) => {
                    stats.degraded_calls += 1;
                    log::warn!("Details lookup failed for {}: {}", place.place_id, e);
                    continue;
                }
            };

            // Prefer the real website over the maps URL
            let website = match details.website.or(details.url) {
                Some(website) => website,
                None => continue,
            };

            let links = self.link_finder.find_event_links(&website, 3).await;
            place.event_link = links.into_iter().next();
            place.website = Some(website);
        }
    }

    /// Collect events from the ticketing source and the curated file.
    /// Per-source failures degrade to empty contributions inside the
    /// adapters themselves.
    async fn collect_events(&self, request: &SearchRequest) -> Vec<EventRecord> {
        let mut events = Vec::new();

        if let Some(ticketing) = &self.ticketing {
            match Self::city_for(request) {
                Some(city) => {
                    // Upstream order is kept: no local dates to sort by
                    events.extend(ticketing.search_by_city(&city).await);
                }
                None => {
                    log::debug!("No city name available, skipping ticketing source");
                }
            }
        }

        // File events are locally dated and arrive already date-sorted
        events.extend(self.events_file.load_upcoming(Utc::now().date_naive()));

        events
    }

    /// Derive a city name for city-keyed event sources: the first comma
    /// segment of the location query. Device coordinates carry no city,
    /// so the ticketing source is skipped for them.
    fn city_for(request: &SearchRequest) -> Option<String> {
        request
            .location_query
            .as_deref()?
            .split(',')
            .next()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_query(q: Option<&str>) -> SearchRequest {
        SearchRequest {
            location_query: q.map(str::to_string),
            center: None,
            radius_m: 5000,
            categories: vec!["school".to_string()],
            keyword: None,
            max_pages: 1,
            find_event_links: false,
        }
    }

    #[test]
    fn test_city_from_location_query() {
        let request = request_with_query(Some("Islamabad, Pakistan"));
        assert_eq!(
            Aggregator::city_for(&request),
            Some("Islamabad".to_string())
        );
    }

    #[test]
    fn test_no_city_without_query() {
        assert_eq!(Aggregator::city_for(&request_with_query(None)), None);
        assert_eq!(Aggregator::city_for(&request_with_query(Some("  ,PK"))), None);
    }
}
