

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheStats, InMemoryObjectStore, ObjectStore};
pub use config::{CacheExpirationSettings, DirectoryConfig};
pub use error::{DirectoryError, Result};
