

pub mod core;
pub mod pws;
pub mod search;
pub mod utils;

pub use utils::safe_truncate_ellipsis;


pub use crate::core::config::{CacheExpirationSettings, DirectoryConfig};
pub use crate::core::error::{DirectoryError, Result};
pub use crate::core::cache::{InMemoryObjectStore, ObjectStore};
pub use pws::{PersonDirectory, PwsClient};
pub use search::{DirectorySearchService, QuerySynchronizer, SearchDirectoryInput, SearchOutput};


pub const DEFAULT_PWS_HOST: &str = "https://it-wseval1.s.uw.edu";


pub const DEFAULT_PWS_PATH: &str = "/identity/v2";


pub const DEFAULT_PAGE_SIZE: u32 = 250;


pub const DEFAULT_FUZZINESS: f64 = 0.25;


pub const DEFAULT_CACHE_CAPACITY: usize = 1000;
