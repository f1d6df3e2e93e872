// src/services/link_finder.rs
// DOCUMENTATION: Event/admission link discovery on place websites
// PURPOSE: Fetch a place homepage and scan its anchors for event-like links

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, Url};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::services::ResponseCache;

/// Keywords that mark an anchor (href or text) as event-like.
const EVENT_KEYWORDS: &[&str] = &[
    "event",
    "events",
    "workshop",
    "workshops",
    "admission",
    "apply",
    "register",
    "course",
    "courses",
    "program",
    "programme",
    "bootcamp",
    "training",
    "seminar",
];

/// Common paths probed when the anchor scan finds nothing.
const HEURISTIC_PATHS: &[&str] = &[
    "/events",
    "/events/",
    "/workshop",
    "/workshops",
    "/admissions",
    "/admission",
    "/apply",
    "/training",
];

/// Identifying User-Agent for polite scraping.
const USER_AGENT: &str =
    "Mozilla/5.0 (compatible; EdumapLinkBot/1.0; +https://example.com/contact)";

const FETCH_TIMEOUT: Duration = Duration::from_secs(8);
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Event-link discovery service.
/// DOCUMENTATION: Best-effort by design - every failure path degrades to
/// "no links found". Lookups are memoized in the shared cache and paced by
/// a rate limiter so a large result page does not burst-fetch dozens of
/// third-party sites.
pub struct LinkFinder {
    client: Client,
    cache: Arc<ResponseCache>,
    limiter: DefaultDirectRateLimiter,
}

impl LinkFinder {
    pub fn new(cache: Arc<ResponseCache>) -> Self {
        // ~6 site fetches per second, matching the politeness delay the
        // upstream sites tolerated in production.
        let quota = Quota::per_second(NonZeroU32::new(6).expect("nonzero"));

        Self {
            client: Client::new(),
            cache,
            limiter: RateLimiter::direct(quota),
        }
    }

    /// Scan a website homepage for event/admission links.
    /// Returns absolute URLs, deduplicated, capped at `max_links`.
    pub async fn find_event_links(&self, website: &str, max_links: usize) -> Vec<String> {
        let cache_key = ResponseCache::links_key(website);
        if let Some(cached) = self.cache.get(&cache_key).await {
            if let Ok(links) = serde_json::from_str::<Vec<String>>(&cached) {
                return links.into_iter().take(max_links).collect();
            }
        }

        self.limiter.until_ready().await;

        let links = self.scan_site(website, max_links).await;

        if let Ok(serialized) = serde_json::to_string(&links) {
            self.cache.set(cache_key, serialized).await;
        }

        links
    }

    async fn scan_site(&self, website: &str, max_links: usize) -> Vec<String> {
        // Ensure a scheme so bare domains still resolve
        let target = if website.contains("://") {
            website.to_string()
        } else {
            format!("http://{}", website)
        };

        let response = match self
            .client
            .get(&target)
            .header("User-Agent", USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                log::debug!("Site fetch failed for {}: {}", website, e);
                return Vec::new();
            }
        };

        // Final URL after redirects is the base for relative hrefs
        let base = response.url().clone();

        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => {
                log::debug!("Site body read failed for {}: {}", website, e);
                return Vec::new();
            }
        };

        let mut links: Vec<String> = Vec::new();
        for (href, text) in extract_anchors(&html) {
            if links.len() >= max_links {
                break;
            }
            if !is_event_like(&href, &text) {
                continue;
            }
            if let Some(abs) = absolutize(&base, &href) {
                if !links.contains(&abs) {
                    links.push(abs);
                }
            }
        }

        if links.is_empty() {
            if let Some(found) = self.probe_common_paths(&base).await {
                links.push(found);
            }
        }

        links
    }

    /// HEAD-probe a fixed list of likely event paths; first 200 wins.
    async fn probe_common_paths(&self, base: &Url) -> Option<String> {
        for path in HEURISTIC_PATHS {
            let candidate = match base.join(path) {
                Ok(url) => url,
                Err(_) => continue,
            };

            let result = self
                .client
                .head(candidate.clone())
                .header("User-Agent", USER_AGENT)
                .timeout(PROBE_TIMEOUT)
                .send()
                .await;

            if let Ok(resp) = result {
                if resp.status().is_success() {
                    return Some(candidate.to_string());
                }
            }
        }
        None
    }
}

/// Whether an anchor looks event-related, by href or visible text.
fn is_event_like(href: &str, text: &str) -> bool {
    let href = href.to_lowercase();
    let text = text.to_lowercase();
    EVENT_KEYWORDS
        .iter()
        .any(|k| href.contains(k) || text.contains(k))
}

/// Resolve an href against the fetched page URL. mailto:, javascript:
/// and in-page fragments are skipped.
fn absolutize(base: &Url, href: &str) -> Option<String> {
    let trimmed = href.trim();
    let lower = trimmed.to_lowercase();
    if trimmed.is_empty()
        || trimmed.starts_with('#')
        || lower.starts_with("mailto:")
        || lower.starts_with("javascript:")
    {
        return None;
    }
    base.join(trimmed).ok().map(|u| u.to_string())
}

/// Case-insensitive ASCII substring search starting at `from`.
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack.get(from..).and_then(|h| {
        h.as_bytes()
            .windows(needle.len())
            .position(|w| w.eq_ignore_ascii_case(needle.as_bytes()))
            .map(|i| from + i)
    })
}

/// Pull (href, inner text) pairs out of raw HTML.
/// Hand-rolled on purpose: the pages scanned here are arbitrary third-party
/// sites and only anchors matter, so a tolerant scanner beats a full parse.
fn extract_anchors(html: &str) -> Vec<(String, String)> {
    let mut anchors = Vec::new();
    let mut pos = 0;

    while let Some(start) = find_ci(html, "<a", pos) {
        // Require a real anchor tag, not <abbr> etc.
        let after = html.as_bytes().get(start + 2).copied();
        if !matches!(after, Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') | Some(b'>')) {
            pos = start + 2;
            continue;
        }

        let tag_end = match find_ci(html, ">", start) {
            Some(i) => i,
            None => break,
        };

        let attrs = &html[start + 2..tag_end];

        let close = find_ci(html, "</a", tag_end).unwrap_or(tag_end + 1);
        let inner = html.get(tag_end + 1..close).unwrap_or("");
        let text = strip_tags(inner);

        if let Some(href) = extract_href(attrs) {
            anchors.push((href, text));
        }

        pos = close.max(tag_end + 1);
    }

    anchors
}

/// Pull the href attribute value out of an anchor's attribute string.
fn extract_href(attrs: &str) -> Option<String> {
    let idx = find_ci(attrs, "href", 0)?;
    let rest = &attrs[idx + 4..];
    let eq = rest.find('=')?;
    let value = rest[eq + 1..].trim_start();

    let href = if let Some(stripped) = value.strip_prefix('"') {
        stripped.split('"').next()?
    } else if let Some(stripped) = value.strip_prefix('\'') {
        stripped.split('\'').next()?
    } else {
        value.split_whitespace().next()?
    };

    if href.is_empty() {
        None
    } else {
        Some(href.to_string())
    }
}

/// Flatten inner HTML to visible text, tags removed, whitespace collapsed.
fn strip_tags(inner: &str) -> String {
    let mut out = String::new();
    let mut in_tag = false;
    for c in inner.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
