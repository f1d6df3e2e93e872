// src/models/marker.rs
// DOCUMENTATION: Map marker projection
// PURPOSE: Flatten place/event records into the rendering-ready marker shape

use geo_types::Point;
use geojson::{Feature, FeatureCollection, Geometry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EventRecord, PlaceRecord};

/// Icon selector understood by the embedded map widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerIcon {
    /// Widget default pin (blue)
    Place,
    /// Orange dot, used for events
    Event,
}

impl MarkerIcon {
    /// Explicit icon URL for the map widget, None for the widget default.
    pub fn url(&self) -> Option<&'static str> {
        match self {
            MarkerIcon::Place => None,
            MarkerIcon::Event => Some("http://maps.google.com/mapfiles/ms/icons/orange-dot.png"),
        }
    }
}

/// The common rendering-ready projection of a place or event record.
/// Coordinates and title are carried over exactly as received from the
/// source; no transformation is applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marker {
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    /// Popup body, line-per-entry; the map page joins with <br/>
    pub popup: Vec<String>,
    /// Category tag: the place category token, or "event"
    pub category: String,
    pub icon: MarkerIcon,
}

impl Marker {
    /// Project a place record into a marker.
    pub fn from_place(place: &PlaceRecord) -> Self {
        let mut popup = Vec::new();
        if let Some(addr) = &place.address {
            if !addr.is_empty() {
                popup.push(addr.clone());
            }
        }
        if let Some(rating) = place.rating {
            popup.push(format!(
                "Rating {} ({})",
                rating,
                place.review_count.unwrap_or(0)
            ));
        }
        let open = place.open_label();
        if !open.is_empty() {
            popup.push(open.to_string());
        }
        if let Some(link) = &place.event_link {
            popup.push(format!("Event / Admission page: {}", link));
        }
        popup.push(format!("Map: {}", place.maps_url));

        Marker {
            latitude: place.latitude,
            longitude: place.longitude,
            title: place.name.clone(),
            popup,
            category: place.category.clone(),
            icon: MarkerIcon::Place,
        }
    }

    /// Project an event record into a marker. Events without coordinates
    /// (city-level sources) cannot be placed and yield None; they still
    /// appear in the list view.
    pub fn from_event(event: &EventRecord) -> Option<Self> {
        let (lat, lng) = match (event.latitude, event.longitude) {
            (Some(lat), Some(lng)) => (lat, lng),
            _ => return None,
        };

        let mut popup = Vec::new();
        if let Some(date) = event.start_date {
            popup.push(format!("Date: {}", date));
        }
        if let Some(venue) = &event.venue {
            popup.push(venue.clone());
        }
        if let Some(desc) = &event.description {
            if !desc.is_empty() {
                popup.push(desc.clone());
            }
        }
        if let Some(link) = &event.link {
            popup.push(format!("More info: {}", link));
        }

        Some(Marker {
            latitude: lat,
            longitude: lng,
            title: event.name.clone(),
            popup,
            category: event
                .category
                .clone()
                .unwrap_or_else(|| "event".to_string()),
            icon: MarkerIcon::Event,
        })
    }
}

/// Serialize markers as a GeoJSON FeatureCollection, one Point feature
/// per marker with title/popup/category carried as properties.
pub fn to_feature_collection(markers: &[Marker]) -> FeatureCollection {
    let features = markers
        .iter()
        .map(|m| {
            let point = Point::new(m.longitude, m.latitude);
            let mut properties = Map::new();
            properties.insert("title".to_string(), Value::String(m.title.clone()));
            properties.insert(
                "popup".to_string(),
                Value::Array(m.popup.iter().cloned().map(Value::String).collect()),
            );
            properties.insert("category".to_string(), Value::String(m.category.clone()));
            if let Some(url) = m.icon.url() {
                properties.insert("icon".to_string(), Value::String(url.to_string()));
            }

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::from(&point))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
