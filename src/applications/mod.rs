// src/applications/mod.rs

pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod validators;


pub use repository::{JobApplicationRepo, SqliteJobApplicationRepo};
pub use routes::applications_routes;
