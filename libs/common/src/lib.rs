//! Common library for the Ink2Text workspace
//!
//! This crate provides shared functionality used across the client and the
//! backend: persisted key-value stores, database connectivity, the OCR engine
//! port and the error types that go with them.
//!
//! ```rust,no_run
//! use common::store::{FileStore, KeyValueStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = FileStore::new("ink2text-state.json");
//!     store.set("user", r#"{"email":"a@b.com"}"#).await?;
//!     println!("{:?}", store.get("user").await?);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod database;
pub mod error;
pub mod ocr;
pub mod store;
