//! Ink2Text backend service
//!
//! Runs OCR on uploaded images and keeps the results in a document store
//! (Postgres, or memory for local runs) behind a small REST API.

pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
