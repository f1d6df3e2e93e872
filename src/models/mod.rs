// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod event;
pub mod marker;
pub mod place;
pub mod search;

pub use event::*;
pub use marker::*;
pub use place::*;
pub use search::*;
