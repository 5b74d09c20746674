//! Naturewatch - citizen-science data-collection backend
//!
//! User registration and JWT authentication plus a species-sightings
//! resource, exposed over HTTP/JSON. Built on axum and PostgreSQL.

pub mod auth;
pub mod config;
pub mod db;
pub mod sightings;
