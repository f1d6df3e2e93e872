// src/bin/fetch.rs
// One-shot CLI: run a search against a running edumap instance and print
// a terminal summary of the aggregated places and events.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::time::{Duration, Instant};

// --- ANSI terminal colors ---
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

#[derive(Deserialize, Debug)]
struct CenterSummary {
    latitude: f64,
    longitude: f64,
    label: String,
    is_fallback: bool,
}

#[derive(Deserialize, Debug)]
struct PlaceSummary {
    name: String,
    rating: Option<f32>,
    review_count: Option<i32>,
    address: Option<String>,
    event_link: Option<String>,
}

#[derive(Deserialize, Debug)]
struct EventSummary {
    name: String,
    start_date: Option<String>,
    link: Option<String>,
}

#[derive(Deserialize, Debug)]
struct StatsSummary {
    place_api_calls: u32,
    degraded_calls: u32,
    duration_ms: u64,
}

#[derive(Deserialize, Debug)]
struct SearchSummary {
    center: CenterSummary,
    places: Vec<PlaceSummary>,
    events: Vec<EventSummary>,
    stats: StatsSummary,
}

#[tokio::main]
async fn main() -> Result<()> {
    let base_url =
        env::var("EDUMAP_URL").unwrap_or_else(|_| "http://127.0.0.1:8003".to_string());

    let query = env::args().nth(1).unwrap_or_else(|| "Islamabad, Pakistan".to_string());

    println!(
        "{}{}edumap fetch{} - searching around '{}{}{}'",
        BOLD, CYAN, RESET, YELLOW, query, RESET
    );

    let client = Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .context("failed to build HTTP client")?;

    let started = Instant::now();
    let response = client
        .get(format!("{}/search", base_url))
        .query(&[("q", query.as_str())])
        .send()
        .await
        .with_context(|| format!("request to {} failed", base_url))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        bail!("service returned {}: {}", status, body);
    }

    let summary: SearchSummary = response
        .json()
        .await
        .context("failed to parse search response")?;

    let center = &summary.center;
    println!(
        "Center: {} ({:.5}, {:.5}){}",
        center.label,
        center.latitude,
        center.longitude,
        if center.is_fallback {
            " [default fallback]"
        } else {
            ""
        }
    );

    println!(
        "\n{}{} places{} ({} API pages, {} degraded calls, {} ms server-side)",
        BOLD,
        summary.places.len(),
        RESET,
        summary.stats.place_api_calls,
        summary.stats.degraded_calls,
        summary.stats.duration_ms
    );
    for place in &summary.places {
        let rating = match (place.rating, place.review_count) {
            (Some(r), Some(n)) => format!(" {}{:.1} ({}){}", GREEN, r, n, RESET),
            (Some(r), None) => format!(" {}{:.1}{}", GREEN, r, RESET),
            _ => String::new(),
        };
        println!(
            "  {}{}{}{} - {}",
            BOLD,
            place.name,
            RESET,
            rating,
            place.address.as_deref().unwrap_or("(no address)")
        );
        if let Some(link) = &place.event_link {
            println!("      event page: {}", link);
        }
    }

    println!("\n{}{} events{}", BOLD, summary.events.len(), RESET);
    for event in &summary.events {
        println!(
            "  {} {}{}",
            event.start_date.as_deref().unwrap_or("(undated)"),
            event.name,
            event
                .link
                .as_ref()
                .map(|l| format!(" - {}", l))
                .unwrap_or_default()
        );
    }

    println!(
        "\nDone in {}{:.1}s{} total.",
        GREEN,
        started.elapsed().as_secs_f64(),
        RESET
    );

    Ok(())
}
