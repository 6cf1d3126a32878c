//! Web layer for the transit navigator.
//!
//! Provides HTTP endpoints for routing between stops, optimising tours and
//! searching stop names.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
