//! Database repositories for Naturewatch
//!
//! This module provides repository implementations for database operations.
//! Repositories encapsulate data access logic and provide a clean API for
//! business logic to interact with the database.

pub mod revoked_token;
pub mod sighting;
pub mod user;

pub use revoked_token::{RevokedTokenRepository, RevokedTokenRepositoryError};
pub use sighting::{SightingRepository, SightingRepositoryError};
pub use user::{UserRepository, UserRepositoryError};
