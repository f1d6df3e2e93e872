// src/lib.rs
// DOCUMENTATION: Library root
// PURPOSE: Expose the crate's modules to the server binary and tests

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
