// src/handlers/health.rs
// DOCUMENTATION: Health check handler
// PURPOSE: Simple endpoint to verify service status

use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use std::sync::Arc;

use crate::services::ResponseCache;

pub async fn health_check(cache: web::Data<Arc<ResponseCache>>) -> impl Responder {
    let cache_stats = cache.stats().await;

    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "edumap",
        "version": env!("CARGO_PKG_VERSION"),
        "cache": cache_stats
    }))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
