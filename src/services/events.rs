// src/services/events.rs
// DOCUMENTATION: Event-source adapters
// PURPOSE: Collect event records from the ticketing API and the curated events file

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;

use crate::models::{parse_event_date, EventOrigin, EventRecord};

// ---------------------------------------------------------------------------
// Ticketing API source
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TicketingResponse {
    #[serde(rename = "_embedded")]
    embedded: Option<TicketingEmbedded>,
}

#[derive(Debug, Deserialize)]
struct TicketingEmbedded {
    #[serde(default)]
    events: Vec<TicketingEvent>,
}

#[derive(Debug, Deserialize)]
struct TicketingEvent {
    name: String,
    url: Option<String>,
    info: Option<String>,
    dates: Option<TicketingDates>,
    #[serde(rename = "_embedded")]
    embedded: Option<TicketingEventEmbedded>,
}

#[derive(Debug, Deserialize)]
struct TicketingDates {
    start: Option<TicketingStart>,
}

#[derive(Debug, Deserialize)]
struct TicketingStart {
    #[serde(rename = "localDate")]
    local_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TicketingEventEmbedded {
    #[serde(default)]
    venues: Vec<TicketingVenue>,
}

#[derive(Debug, Deserialize)]
struct TicketingVenue {
    name: Option<String>,
    location: Option<TicketingVenueLocation>,
}

/// Venue coordinates arrive as strings on this API.
#[derive(Debug, Deserialize)]
struct TicketingVenueLocation {
    latitude: Option<String>,
    longitude: Option<String>,
}

/// Ticketing events adapter, queried by city name.
/// DOCUMENTATION: The upstream source exposes no stable event identifiers
/// and re-running an unchanged query can yield a different set; both are
/// accepted behavior, so no deduplication is attempted here.
pub struct TicketingClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TicketingClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://app.ticketmaster.com/discovery/v2".to_string(),
        }
    }

    /// Override the upstream base URL. Used by tests against a mock server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Fetch events for a city. Failures degrade to an empty list with a
    /// warning; a single slow or broken event source must not sink the
    /// whole aggregation pass.
    pub async fn search_by_city(&self, city: &str) -> Vec<EventRecord> {
        let url = format!("{}/events.json", self.base_url);
        let params = [("city", city), ("apikey", &self.api_key)];

        log::debug!("Ticketing search: city={}", city);

        let response = match self.client.get(&url).query(&params).send().await {
            Ok(resp) => resp,
            Err(e) => {
                log::warn!("Ticketing request failed: {}", e);
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            log::warn!("Ticketing API returned HTTP {}", response.status());
            return Vec::new();
        }

        let payload: TicketingResponse = match response.json().await {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Failed to parse ticketing response: {}", e);
                return Vec::new();
            }
        };

        let events = payload
            .embedded
            .map(|e| e.events)
            .unwrap_or_default()
            .into_iter()
            .map(Self::to_record)
            .collect::<Vec<_>>();

        log::info!("Ticketing search returned {} events for {}", events.len(), city);
        events
    }

    fn to_record(raw: TicketingEvent) -> EventRecord {
        let start_date = raw
            .dates
            .and_then(|d| d.start)
            .and_then(|s| s.local_date)
            .and_then(|d| parse_event_date(&d));

        let venue = raw.embedded.and_then(|e| e.venues.into_iter().next());
        let (venue_name, latitude, longitude) = match venue {
            Some(v) => {
                // Coordinates are strings upstream; unparsable means the
                // event stays city-level (list only, no marker).
                let (lat, lng) = match v.location {
                    Some(loc) => (
                        loc.latitude.and_then(|s| s.parse::<f64>().ok()),
                        loc.longitude.and_then(|s| s.parse::<f64>().ok()),
                    ),
                    None => (None, None),
                };
                (v.name, lat, lng)
            }
            None => (None, None, None),
        };

        EventRecord {
            name: raw.name,
            description: raw.info,
            start_date,
            venue: venue_name,
            category: None,
            latitude,
            longitude,
            link: raw.url,
            origin: EventOrigin::Ticketing,
        }
    }
}

// ---------------------------------------------------------------------------
// Curated events file source
// ---------------------------------------------------------------------------

/// Loader for the manually curated flat events file.
/// DOCUMENTATION: Delimited text with a header row:
/// name,lat,lng,date,type,description,link
/// Rows with an unparsable date or coordinates are dropped; surviving rows
/// are filtered to today-or-later and sorted by ascending date.
pub struct EventsFile {
    path: String,
}

impl EventsFile {
    pub fn new(path: String) -> Self {
        Self { path }
    }

    /// Load upcoming events, relative to `today`. A missing or unreadable
    /// file yields an empty list, not an error.
    pub fn load_upcoming(&self, today: NaiveDate) -> Vec<EventRecord> {
        let content = match std::fs::read_to_string(Path::new(&self.path)) {
            Ok(content) => content,
            Err(e) => {
                log::info!("Events file {} not loaded: {}", self.path, e);
                return Vec::new();
            }
        };

        let mut events = parse_events_file(&content);
        events.retain(|e| matches!(e.start_date, Some(date) if date >= today));
        events.sort_by_key(|e| e.start_date);

        log::info!(
            "Loaded {} upcoming events from {}",
            events.len(),
            self.path
        );
        events
    }
}

/// Parse the events file body. The first line is a header and is skipped.
fn parse_events_file(content: &str) -> Vec<EventRecord> {
    content
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .filter_map(parse_events_line)
        .collect()
}

fn parse_events_line(line: &str) -> Option<EventRecord> {
    let fields = split_delimited(line, ',');
    if fields.len() < 4 {
        return None;
    }

    let latitude = fields[1].trim().parse::<f64>().ok()?;
    let longitude = fields[2].trim().parse::<f64>().ok()?;
    let start_date = parse_event_date(&fields[3])?;

    let get = |i: usize| {
        fields
            .get(i)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Some(EventRecord {
        name: fields[0].trim().to_string(),
        description: get(5),
        start_date: Some(start_date),
        venue: None,
        category: get(4),
        latitude: Some(latitude),
        longitude: Some(longitude),
        link: get(6),
        origin: EventOrigin::File,
    })
}

/// Split one delimited line, honoring double-quoted fields so commas in
/// descriptions survive.
fn split_delimited(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = "\
name,lat,lng,date,type,description,link
Python Bootcamp,33.70,73.05,2030-01-15,workshop,\"Hands-on, beginner friendly\",https://example.com/bootcamp
Old Seminar,33.70,73.05,2019-05-01,seminar,Long past,https://example.com/old
IELTS Open Day,33.71,73.06,2030-01-10,admission,,
Broken Row,not-a-lat,73.05,2030-02-01,x,,
Undated Row,33.70,73.05,sometime soon,x,,
";

    #[test]
    fn test_split_delimited_quoted() {
        let fields = split_delimited("a,\"b, c\",d", ',');
        assert_eq!(fields, vec!["a", "b, c", "d"]);
    }

    #[test]
    fn test_parse_drops_bad_rows() {
        let events = parse_events_file(FILE);
        // Broken coordinates and unparsable dates are silently dropped
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.origin == EventOrigin::File));
    }

    #[test]
    fn test_quoted_description_survives() {
        let events = parse_events_file(FILE);
        let bootcamp = events.iter().find(|e| e.name == "Python Bootcamp").unwrap();

        assert_eq!(
            bootcamp.description.as_deref(),
            Some("Hands-on, beginner friendly")
        );
        assert_eq!(bootcamp.category.as_deref(), Some("workshop"));
        assert_eq!(bootcamp.link.as_deref(), Some("https://example.com/bootcamp"));
        assert_eq!(bootcamp.latitude, Some(33.70));
    }

    #[test]
    fn test_load_upcoming_filters_and_sorts() {
        let dir = std::env::temp_dir().join("edumap-events-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("events.txt");
        std::fs::write(&path, FILE).unwrap();

        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let events = EventsFile::new(path.to_string_lossy().into_owned()).load_upcoming(today);

        // Past seminar filtered out, remaining sorted ascending by date
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "IELTS Open Day");
        assert_eq!(events[1].name, "Python Bootcamp");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let events = EventsFile::new("/nonexistent/events.txt".to_string())
            .load_upcoming(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(events.is_empty());
    }
}
