pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{StorefrontError, StorefrontResult};
pub use types::{ComponentDescriptor, PageDocument};
