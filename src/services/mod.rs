// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod aggregator;
pub mod cache;
pub mod events;
pub mod geocoder;
pub mod link_finder;
pub mod places_client;

pub use aggregator::*;
pub use cache::*;
pub use events::*;
pub use geocoder::*;
pub use link_finder::*;
pub use places_client::*;
