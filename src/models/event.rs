// src/models/event.rs
// DOCUMENTATION: Core data structures for events
// PURPOSE: Event record shared by all event sources, plus best-effort date parsing

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which adapter produced an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOrigin {
    /// Ticketing HTTP API, queried by city name
    Ticketing,
    /// Curated flat events file
    File,
}

/// An entry describing a dated happening.
/// DOCUMENTATION: Ephemeral record, created per search pass. Event sources
/// expose no stable identifier, so no cross-source deduplication is applied;
/// re-running a query can legitimately yield a different set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Display name
    pub name: String,

    /// Optional free-text description
    pub description: Option<String>,

    /// Start date, when it could be parsed
    pub start_date: Option<NaiveDate>,

    /// Venue name, when the source provides one
    pub venue: Option<String>,

    /// Category tag (workshop, seminar, admission, ...), when known
    pub category: Option<String>,

    /// Latitude. Some sources yield only a city-level location, so
    /// coordinates are optional; such events render in the list only.
    pub latitude: Option<f64>,

    /// Longitude
    pub longitude: Option<f64>,

    /// Link to the source page
    pub link: Option<String>,

    /// Adapter that produced this record
    pub origin: EventOrigin,
}

/// Date formats accepted by the best-effort parser, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Parse a date string from an upstream source.
/// DOCUMENTATION: Best effort only - unparsable input yields None and is
/// treated as "unspecified", never an error. Full RFC 3339 timestamps are
/// accepted too and truncated to their date.
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    // Timestamp forms: "2025-09-01T19:00:00Z" and friends
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 9, 14).unwrap();

        assert_eq!(parse_event_date("2025-09-14"), Some(expected));
        assert_eq!(parse_event_date("14/09/2025"), Some(expected));
        assert_eq!(parse_event_date("September 14, 2025"), Some(expected));
        assert_eq!(parse_event_date("14 Sep 2025"), Some(expected));
    }

    #[test]
    fn test_parse_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2025, 9, 14).unwrap();

        assert_eq!(parse_event_date("2025-09-14T19:30:00+05:00"), Some(expected));
        assert_eq!(parse_event_date("2025-09-14 19:30:00"), Some(expected));
    }

    #[test]
    fn test_unparsable_yields_none() {
        assert_eq!(parse_event_date(""), None);
        assert_eq!(parse_event_date("   "), None);
        assert_eq!(parse_event_date("next friday-ish"), None);
        assert_eq!(parse_event_date("14.09"), None);
    }
}
