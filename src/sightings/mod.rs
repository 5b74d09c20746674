//! Sightings module for Naturewatch
//!
//! Validates and persists species observations submitted by citizens,
//! with or without an account.

pub mod api;

pub use api::{SightingsApiState, sightings_router};
