#![warn(clippy::unwrap_used)]

pub mod content;
pub mod error;
pub mod page_rest;
pub mod quiz_rest;
pub mod rest;
pub mod server;

pub use content::ContentDirectory;
pub use rest::AppState;
pub use server::{router, ApiServer};
