// Common module - shared types and utilities across all modules

pub mod config;
pub mod error;
pub mod extract;
pub mod helpers;
pub mod migrations;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod test_support;

// Re-export commonly used types for convenience
pub use error::ApiError;
pub use extract::{JsonBody, PathParam, QueryParams};
pub use helpers::{found, safe_token_log};
pub use state::AppState;
pub use validation::{require_text, ValidationError, ValidationResult, Validator};
