//! API request handlers.

pub mod admin;
pub mod content;
pub mod health;
pub mod placeholder;
pub mod products;

pub use admin::*;
pub use content::*;
pub use health::*;
pub use placeholder::*;
pub use products::*;
