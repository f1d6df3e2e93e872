// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, caches and adapters, and start the HTTP server

use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use std::sync::Arc;

use edumap::config::Config;
use edumap::handlers;
use edumap::services::{start_cleanup_task, Aggregator, ResponseCache};

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration. A missing Google Maps key halts here,
    //    before any network call.
    let config = Config::from_env();
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            &config.log_level
        } else {
            "info,actix_web=info"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    log::info!("Starting edumap aggregation service...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Initialize the upstream response cache
    let cache = Arc::new(ResponseCache::new(config.cache_ttl_seconds));
    log::info!(
        "Initialized response cache (TTL: {}s)",
        config.cache_ttl_seconds
    );

    // Background cleanup every 5 minutes
    start_cleanup_task(cache.clone(), 300);

    // 5. Wire the aggregation pipeline
    let aggregator = web::Data::new(Aggregator::from_config(&config, cache.clone()));

    // 6. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let config_clone = config.clone();

    HttpServer::new(move || {
        App::new()
            // Application state (config, cache, aggregation pipeline)
            .app_data(web::Data::new(config_clone.clone()))
            .app_data(web::Data::new(cache.clone()))
            .app_data(aggregator.clone())
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::search_config)
            .configure(handlers::map_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}
