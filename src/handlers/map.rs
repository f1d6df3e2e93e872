// src/handlers/map.rs
// DOCUMENTATION: Embedded map page handler
// PURPOSE: Render a self-contained HTML document with both marker sets
// inlined for the third-party map widget

use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::config::Config;
use crate::errors::EdumapError;
use crate::models::{Marker, SearchQuery, SearchRequest};
use crate::services::Aggregator;

/// GET /map
/// Run one aggregation pass and return the interactive map page.
/// Intended for local/demo use: the widget script URL embeds the API key,
/// exactly like the page this service replaces.
pub async fn map_page(
    aggregator: web::Data<Aggregator>,
    config: web::Data<Config>,
    query: web::Query<SearchQuery>,
) -> Result<impl Responder, EdumapError> {
    if let Err(e) = query.validate() {
        return Err(EdumapError::ValidationError(e.to_string()));
    }

    let request = SearchRequest::from_query(&query)?;
    let outcome = aggregator.run(&request).await?;

    // Tighter zoom for small radii
    let zoom = if request.radius_m <= 5000 { 14 } else { 12 };

    let html = render_map_html(
        &config.google_maps_api_key,
        outcome.center.latitude,
        outcome.center.longitude,
        zoom,
        &outcome.place_markers,
        &outcome.event_markers,
    )?;

    Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(html))
}

/// Inline a marker list as a script-safe JSON literal.
fn inline_json(markers: &[Marker]) -> Result<String, EdumapError> {
    serde_json::to_string(markers)
        .map(|json| json.replace("</", "<\\/"))
        .map_err(|e| EdumapError::ExternalApiError(format!("Marker serialization failed: {}", e)))
}

fn render_map_html(
    api_key: &str,
    lat: f64,
    lng: f64,
    zoom: u8,
    place_markers: &[Marker],
    event_markers: &[Marker],
) -> Result<String, EdumapError> {
    let places_json = inline_json(place_markers)?;
    let events_json = inline_json(event_markers)?;

    Ok(format!(
        r##"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8" />
    <style>html, body, #map {{ height: 100%; margin: 0; padding: 0; }}</style>
    <script src="https://maps.googleapis.com/maps/api/js?key={api_key}"></script>
  </head>
  <body><div id="map"></div>
  <script>
    const center = {{lat: {lat}, lng: {lng}}};
    const places = {places_json};
    const events = {events_json};
    const map = new google.maps.Map(document.getElementById('map'), {{
      center: center, zoom: {zoom}, mapTypeControl: false
    }});

    new google.maps.Marker({{
      position: center, map, title: "You are here",
      icon: {{path: google.maps.SymbolPath.CIRCLE, scale: 6, fillColor: "#2ecc71",
             fillOpacity: 1, strokeWeight: 2, strokeColor: "#1e824c"}}
    }});

    const infow = new google.maps.InfoWindow();

    const place = (m) => {{
      const opts = {{position: {{lat: m.latitude, lng: m.longitude}}, map, title: m.title}};
      if (m.icon === "event") {{
        opts.icon = "http://maps.google.com/mapfiles/ms/icons/orange-dot.png";
      }}
      const mk = new google.maps.Marker(opts);
      const html = [`<b>${{m.title}}</b>`].concat(m.popup).join("<br/>");
      mk.addListener('click', () => {{ infow.setContent(html); infow.open({{anchor: mk, map}}); }});
    }};

    places.forEach(place);
    events.forEach(place);
  </script></body>
</html>
"##
    ))
}

/// Configuration for the map route
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/map", web::get().to(map_page));
}
