// src/config/env.rs
// DOCUMENTATION: Environment variable management
// PURPOSE: Load and validate configuration from .env files

use dotenv::dotenv;
use std::env;

/// Application configuration loaded from environment variables
/// DOCUMENTATION: Centralizes all configuration in one struct
/// Load with Config::from_env() at application startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "127.0.0.1")
    pub server_address: String,

    /// Server listen port (default 8003)
    pub server_port: u16,

    /// Environment: development, staging, production
    pub environment: String,

    /// Log level: debug, info, warn, error
    pub log_level: String,

    /// Google Maps API key (Geocoding + Places + JS map widget).
    /// Required: startup halts before any network call when absent.
    pub google_maps_api_key: String,

    /// Ticketing events API key. Optional: the ticketing event source
    /// is simply skipped when not configured.
    pub ticketing_api_key: String,

    /// Path to the curated flat events file (delimited text)
    pub events_file: String,

    /// Fallback center latitude, used when geocoding yields nothing
    pub default_lat: f64,

    /// Fallback center longitude
    pub default_lng: f64,

    /// TTL for memoized upstream responses, in seconds
    pub cache_ttl_seconds: u64,

    /// Delay between paginated Nearby Search calls, in milliseconds.
    /// The upstream pagination contract requires waiting before a
    /// next_page_token becomes valid.
    pub page_delay_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    /// DOCUMENTATION: Reads from .env or process environment
    /// Called once at application startup
    pub fn from_env() -> Self {
        // Load .env file if it exists
        dotenv().ok();

        Config {
            server_address: env::var("SERVER_ADDRESS").unwrap_or_else(|_| "127.0.0.1".to_string()),

            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8003".to_string())
                .parse()
                .unwrap_or(8003),

            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            google_maps_api_key: env::var("GOOGLE_MAPS_API_KEY").unwrap_or_else(|_| String::new()),

            ticketing_api_key: env::var("TICKETING_API_KEY").unwrap_or_else(|_| String::new()),

            events_file: env::var("EVENTS_FILE").unwrap_or_else(|_| "events.txt".to_string()),

            // Islamabad city center, matching the original deployment
            default_lat: env::var("DEFAULT_LAT")
                .unwrap_or_else(|_| "33.6844".to_string())
                .parse()
                .unwrap_or(33.6844),

            default_lng: env::var("DEFAULT_LNG")
                .unwrap_or_else(|_| "73.0479".to_string())
                .parse()
                .unwrap_or(73.0479),

            cache_ttl_seconds: env::var("CACHE_TTL_SECONDS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .unwrap_or(86400),

            page_delay_ms: env::var("PAGE_DELAY_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .unwrap_or(2000),
        }
    }

    /// Validate critical configuration
    /// DOCUMENTATION: Ensures the service can start safely.
    /// A missing Google Maps key is fatal: every search pass depends on it,
    /// so we refuse to start rather than fail on the first request.
    pub fn validate(&self) -> Result<(), String> {
        if self.google_maps_api_key.is_empty() {
            return Err(
                "GOOGLE_MAPS_API_KEY is required. Set it in .env or the environment.".to_string(),
            );
        }

        if self.ticketing_api_key.is_empty() {
            log::warn!("TICKETING_API_KEY not configured - ticketing event source disabled");
        }

        Ok(())
    }
}
