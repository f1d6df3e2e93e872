// tests/search_flow.rs
// End-to-end adapter behavior against a mock HTTP server: pagination,
// identifier deduplication, token retry and geocode fallback.

use std::sync::Arc;

use edumap::models::SearchRequest;
use edumap::services::{
    Aggregator, EventsFile, GeocoderClient, LinkFinder, PlacesClient, ResponseCache,
    TicketingClient, MAX_ENRICHED_PLACES,
};
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;

const CENTER: (f64, f64) = (33.6844, 73.0479);

fn request(categories: &[&str], keyword: Option<&str>, max_pages: u32) -> SearchRequest {
    SearchRequest {
        location_query: None,
        center: Some(CENTER),
        radius_m: 5000,
        categories: categories.iter().map(|s| s.to_string()).collect(),
        keyword: keyword.map(str::to_string),
        max_pages,
        find_event_links: false,
    }
}

fn places_client(server: &ServerGuard) -> PlacesClient {
    let cache = Arc::new(ResponseCache::new(60));
    // Zero page delay: tests should not sleep
    PlacesClient::new("test_key".to_string(), cache, 0).with_base_url(&server.url())
}

fn nearby_result(id: &str, name: &str) -> serde_json::Value {
    json!({
        "place_id": id,
        "name": name,
        "geometry": { "location": { "lat": 33.69, "lng": 73.06 } },
        "vicinity": "Islamabad",
        "rating": 4.0,
        "user_ratings_total": 10
    })
}

#[tokio::test]
async fn duplicate_identifiers_collapse_across_calls() {
    let mut server = Server::new_async().await;

    // Category call returns A, B, C
    let school_mock = server
        .mock("GET", "/nearbysearch/json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("type".into(), "school".into()),
            Matcher::UrlEncoded("radius".into(), "5000".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "status": "OK",
                "results": [
                    nearby_result("A", "Alpha School"),
                    nearby_result("B", "Beta School"),
                    nearby_result("C", "Gamma School"),
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    // Broad-keyword branch returns B (duplicate) and D
    let training_mock = server
        .mock("GET", "/nearbysearch/json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("type".into(), "establishment".into()),
            Matcher::UrlEncoded("keyword".into(), "training".into()),
        ]))
        .with_status(200)
        .with_body(
            json!({
                "status": "OK",
                "results": [
                    nearby_result("B", "Beta School"),
                    nearby_result("D", "Delta Institute"),
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = places_client(&server);
    let req = request(&["school", "training_like"], Some("training"), 2);
    let outcome = client.search_nearby(CENTER, &req).await;

    school_mock.assert_async().await;
    training_mock.assert_async().await;

    // First occurrence wins: 4 survivors, upstream order preserved
    let ids: Vec<&str> = outcome.records.iter().map(|r| r.place_id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B", "C", "D"]);
    assert_eq!(outcome.failed_calls, 0);
}

#[tokio::test]
async fn pagination_follows_token_up_to_depth_limit() {
    let mut server = Server::new_async().await;

    let first_page = server
        .mock("GET", "/nearbysearch/json")
        .match_query(Matcher::UrlEncoded("type".into(), "library".into()))
        .with_status(200)
        .with_body(
            json!({
                "status": "OK",
                "results": [nearby_result("P1", "First")],
                "next_page_token": "tok2"
            })
            .to_string(),
        )
        .create_async()
        .await;

    // Declared after the generic mock so the token request lands here.
    // It advertises yet another token, but max_pages=2 stops after it.
    let second_page = server
        .mock("GET", "/nearbysearch/json")
        .match_query(Matcher::UrlEncoded("pagetoken".into(), "tok2".into()))
        .with_status(200)
        .with_body(
            json!({
                "status": "OK",
                "results": [nearby_result("P2", "Second")],
                "next_page_token": "tok3"
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let client = places_client(&server);
    let outcome = client
        .search_nearby(CENTER, &request(&["library"], None, 2))
        .await;

    first_page.assert_async().await;
    second_page.assert_async().await;

    let ids: Vec<&str> = outcome.records.iter().map(|r| r.place_id.as_str()).collect();
    assert_eq!(ids, vec!["P1", "P2"]);
    assert_eq!(outcome.api_calls, 2);
}

#[tokio::test]
async fn rejected_token_is_retried_once_then_degrades() {
    let mut server = Server::new_async().await;

    let first_page = server
        .mock("GET", "/nearbysearch/json")
        .match_query(Matcher::UrlEncoded("type".into(), "school".into()))
        .with_status(200)
        .with_body(
            json!({
                "status": "OK",
                "results": [nearby_result("S1", "Survivor")],
                "next_page_token": "never-valid"
            })
            .to_string(),
        )
        .create_async()
        .await;

    // The continuation token is rejected on both the initial call and the
    // single retry; the call then degrades, keeping page-one records.
    let rejected = server
        .mock("GET", "/nearbysearch/json")
        .match_query(Matcher::UrlEncoded("pagetoken".into(), "never-valid".into()))
        .with_status(200)
        .with_body(json!({ "status": "INVALID_REQUEST", "results": [] }).to_string())
        .expect(2)
        .create_async()
        .await;

    let client = places_client(&server);
    let outcome = client
        .search_nearby(CENTER, &request(&["school"], None, 3))
        .await;

    first_page.assert_async().await;
    rejected.assert_async().await;

    let ids: Vec<&str> = outcome.records.iter().map(|r| r.place_id.as_str()).collect();
    assert_eq!(ids, vec!["S1"]);
    assert_eq!(outcome.failed_calls, 1);
}

#[tokio::test]
async fn empty_upstream_yields_empty_markers_not_error() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/nearbysearch/json")
        .with_status(200)
        .with_body(json!({ "status": "ZERO_RESULTS", "results": [] }).to_string())
        .create_async()
        .await;

    let aggregator = aggregator_for(&server);
    let outcome = aggregator
        .run(&request(&["school"], None, 1))
        .await
        .expect("empty upstream is not an error");

    assert!(outcome.places.is_empty());
    assert!(outcome.place_markers.is_empty());
    assert!(outcome.event_markers.is_empty());
}

#[tokio::test]
async fn geocode_miss_falls_back_to_default_center() {
    let mut server = Server::new_async().await;

    let geocode_mock = server
        .mock("GET", "/json")
        .match_query(Matcher::UrlEncoded("address".into(), "Nowhere At All".into()))
        .with_status(200)
        .with_body(json!({ "status": "ZERO_RESULTS", "results": [] }).to_string())
        .create_async()
        .await;

    server
        .mock("GET", "/nearbysearch/json")
        .with_status(200)
        .with_body(json!({ "status": "ZERO_RESULTS", "results": [] }).to_string())
        .create_async()
        .await;

    let aggregator = aggregator_for(&server);
    let mut req = request(&["school"], None, 1);
    req.center = None;
    req.location_query = Some("Nowhere At All".to_string());

    let outcome = aggregator.run(&req).await.unwrap();

    geocode_mock.assert_async().await;
    assert!(outcome.center.is_fallback);
    assert_eq!(outcome.center.latitude, CENTER.0);
    assert_eq!(outcome.center.longitude, CENTER.1);
    assert!(outcome.stats.used_default_center);
}

#[tokio::test]
async fn link_enrichment_populates_links_and_degrades_per_place() {
    let mut server = Server::new_async().await;

    let mut top = nearby_result("P1", "Top Academy");
    top["rating"] = json!(4.8);
    let runner_up = nearby_result("P2", "Runner-up School");

    server
        .mock("GET", "/nearbysearch/json")
        .match_query(Matcher::UrlEncoded("type".into(), "school".into()))
        .with_status(200)
        .with_body(json!({ "status": "OK", "results": [top, runner_up] }).to_string())
        .create_async()
        .await;

    // Details for the top place point at a homepage on this same server
    let site_url = format!("{}/site", server.url());
    let top_details = server
        .mock("GET", "/details/json")
        .match_query(Matcher::UrlEncoded("place_id".into(), "P1".into()))
        .with_status(200)
        .with_body(
            json!({
                "status": "OK",
                "result": { "name": "Top Academy", "website": site_url }
            })
            .to_string(),
        )
        .create_async()
        .await;

    // Details for the second place fail outright; the pass must continue
    let broken_details = server
        .mock("GET", "/details/json")
        .match_query(Matcher::UrlEncoded("place_id".into(), "P2".into()))
        .with_status(500)
        .create_async()
        .await;

    server
        .mock("GET", "/site")
        .with_status(200)
        .with_body(r#"<html><body><a href="/site/events">Upcoming events</a></body></html>"#)
        .create_async()
        .await;

    let aggregator = aggregator_for(&server);
    let mut req = request(&["school"], None, 1);
    req.find_event_links = true;

    let outcome = aggregator.run(&req).await.unwrap();

    top_details.assert_async().await;
    broken_details.assert_async().await;

    // Rating sort puts the enriched place first
    let top = &outcome.places[0];
    assert_eq!(top.place_id, "P1");
    assert_eq!(top.website.as_deref(), Some(site_url.as_str()));
    assert_eq!(
        top.event_link.as_deref(),
        Some(format!("{}/site/events", server.url()).as_str())
    );

    let runner_up = &outcome.places[1];
    assert_eq!(runner_up.place_id, "P2");
    assert!(runner_up.website.is_none());
    assert!(runner_up.event_link.is_none());

    assert_eq!(outcome.stats.detail_lookups, 2);
    assert_eq!(outcome.stats.degraded_calls, 1);
}

#[tokio::test]
async fn link_enrichment_visits_at_most_the_cap() {
    let mut server = Server::new_async().await;

    let results: Vec<serde_json::Value> = (0..25)
        .map(|i| nearby_result(&format!("Q{}", i), &format!("School {}", i)))
        .collect();

    server
        .mock("GET", "/nearbysearch/json")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({ "status": "OK", "results": results }).to_string())
        .create_async()
        .await;

    // Websiteless details: enrichment moves on without any site fetch
    let details = server
        .mock("GET", "/details/json")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({ "status": "OK", "result": {} }).to_string())
        .expect(MAX_ENRICHED_PLACES)
        .create_async()
        .await;

    let aggregator = aggregator_for(&server);
    let mut req = request(&["school"], None, 1);
    req.find_event_links = true;

    let outcome = aggregator.run(&req).await.unwrap();

    details.assert_async().await;
    assert_eq!(outcome.places.len(), 25);
    assert_eq!(outcome.stats.detail_lookups as usize, MAX_ENRICHED_PLACES);
    assert_eq!(outcome.stats.degraded_calls, 0);
}

#[tokio::test]
async fn ticketing_events_parse_city_level_and_located() {
    let mut server = Server::new_async().await;

    server
        .mock("GET", "/events.json")
        .match_query(Matcher::UrlEncoded("city".into(), "Islamabad".into()))
        .with_status(200)
        .with_body(
            json!({
                "_embedded": {
                    "events": [
                        {
                            "name": "Tech Expo",
                            "url": "https://tickets.example/expo",
                            "dates": { "start": { "localDate": "2030-03-01" } },
                            "_embedded": {
                                "venues": [{
                                    "name": "Expo Center",
                                    "location": { "latitude": "33.70", "longitude": "73.05" }
                                }]
                            }
                        },
                        {
                            "name": "City Fair",
                            "dates": { "start": { "localDate": "not a date" } }
                        }
                    ]
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client =
        TicketingClient::new("tk".to_string()).with_base_url(&server.url());
    let events = client.search_by_city("Islamabad").await;

    assert_eq!(events.len(), 2);

    let expo = &events[0];
    assert_eq!(expo.name, "Tech Expo");
    assert_eq!(expo.venue.as_deref(), Some("Expo Center"));
    assert_eq!(expo.latitude, Some(33.70));
    assert_eq!(
        expo.start_date,
        chrono::NaiveDate::from_ymd_opt(2030, 3, 1)
    );

    // Unparsable date and missing venue degrade to unspecified fields
    let fair = &events[1];
    assert_eq!(fair.start_date, None);
    assert_eq!(fair.latitude, None);
}

fn aggregator_for(server: &ServerGuard) -> Aggregator {
    let cache = Arc::new(ResponseCache::new(60));

    Aggregator::new(
        GeocoderClient::new("test_key".to_string(), cache.clone())
            .with_base_url(&server.url()),
        PlacesClient::new("test_key".to_string(), cache.clone(), 0)
            .with_base_url(&server.url()),
        None,
        EventsFile::new("/nonexistent/events.txt".to_string()),
        LinkFinder::new(cache),
        CENTER,
    )
}
