// src/handlers/search.rs
// DOCUMENTATION: HTTP handlers for the aggregation surface
// PURPOSE: Parse and validate queries, run the aggregator, return results

use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::errors::EdumapError;
use crate::models::{SearchQuery, SearchRequest};
use crate::services::Aggregator;

/// GET /search
/// Run one aggregation pass and return records plus markers as JSON.
pub async fn search(
    aggregator: web::Data<Aggregator>,
    query: web::Query<SearchQuery>,
) -> Result<impl Responder, EdumapError> {
    if let Err(e) = query.validate() {
        return Err(EdumapError::ValidationError(e.to_string()));
    }

    let request = SearchRequest::from_query(&query)?;
    let outcome = aggregator.run(&request).await?;

    Ok(HttpResponse::Ok().json(outcome))
}

/// GET /search/geojson
/// Same pass, rendered as a GeoJSON FeatureCollection of all markers.
pub async fn search_geojson(
    aggregator: web::Data<Aggregator>,
    query: web::Query<SearchQuery>,
) -> Result<impl Responder, EdumapError> {
    if let Err(e) = query.validate() {
        return Err(EdumapError::ValidationError(e.to_string()));
    }

    let request = SearchRequest::from_query(&query)?;
    let outcome = aggregator.run(&request).await?;

    Ok(HttpResponse::Ok()
        .content_type("application/geo+json")
        .json(outcome.to_geojson()))
}

/// Configuration for search routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/search")
            .route("", web::get().to(search))
            .route("/geojson", web::get().to(search_geojson)),
    );
}
