//! # Auth Module
//!
//! This module handles all authentication-related functionality including:
//! - Password registration and login through the credential store
//! - JWT token generation and validation
//! - Third-party OAuth sign-in (GitHub, Google)
//! - AuthedUser extractor for protected routes

pub mod credentials;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod oauth;
pub mod routes;
pub mod token;
pub mod validators;


pub use credentials::{CredentialStore, SqliteCredentialStore};
pub use extractors::AuthedUser;
pub use oauth::OAuthClient;
pub use routes::auth_routes;
pub use token::TokenService;
