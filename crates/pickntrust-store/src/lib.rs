//! SQLite persistence for PickNTrust.
//!
//! One [`Database`] wraps the connection to the site database holding
//! `unified_content`, `channel_posts` and `affiliate_conversions`. Opening a
//! database migrates its schema, so databases created by older releases gain
//! any missing column.
//!
//! # Example
//!
//! ```no_run
//! use pickntrust_store::{Database, Pagination};
//! use pickntrust_models::ContentBuilder;
//!
//! let db = Database::open("/tmp/pickntrust.sqlite".as_ref()).unwrap();
//!
//! let content = ContentBuilder::new("Boat Airdopes 141", "https://amzn.to/abc")
//!     .price("999")
//!     .build();
//! db.insert_content(&content).unwrap();
//!
//! let home = db.list_page("home", None, Pagination::default()).unwrap();
//! ```

pub mod atomic;
pub mod backup;
pub mod channel_posts;
pub mod content;
pub mod db;
pub mod error;
pub mod maintenance;
pub mod queries;
pub mod schema;

pub use backup::{load_export, EXPORT_PREFIX};
pub use channel_posts::ConversionRecord;
pub use db::Database;
pub use error::{Result, StoreError};
pub use maintenance::MaintenanceReport;
pub use queries::{Pagination, StoreStats};
