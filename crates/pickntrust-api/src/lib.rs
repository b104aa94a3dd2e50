//! REST API for PickNTrust.
//!
//! This crate serves the site's content over HTTP:
//! - Page, category, featured, service and app listings
//! - Unified content CRUD under `/api/content`
//! - Admin routes guarded by the admin password
//! - SVG placeholder images
//!
//! # Example
//!
//! ```ignore
//! use pickntrust_api::{ApiConfig, AppState, serve};
//! use pickntrust_core::Settings;
//! use pickntrust_store::Database;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::from_env();
//!     let db = Arc::new(Database::open(&settings.database_path)?);
//!     let config = ApiConfig::from_settings(&settings);
//!     let state = AppState::new(config.clone(), db, settings);
//!
//!     serve(config, state).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod types;

pub use auth::{verify_admin, AdminAccess, ADMIN_PASSWORD_HEADER};
pub use config::ApiConfig;
pub use error::{ApiError, Result};
pub use router::{create_router, serve, serve_with};
pub use state::AppState;
