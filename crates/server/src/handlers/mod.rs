//! # API Route Handlers
//!
//! This module organizes all the Axum route handlers for the `bookmeta-server`.

// Sub-modules for different handler categories.
pub mod general;
pub mod logs;
pub mod pdf;

// Re-export all handlers from the sub-modules to make them easily accessible
// to the router under a single `handlers::` path.
pub use general::*;
pub use logs::*;
pub use pdf::*;

// Shared items used by multiple handler modules.
use super::{errors::AppError, state::AppState};
