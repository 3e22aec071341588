

pub mod filter;
pub mod input;
pub mod name_analyzer;
pub mod query_generator;
pub mod reducer;
pub mod service;
pub mod similarity;
pub mod synchronizer;

pub use filter::{ConstraintPredicate, NameField, PersonFilter, RecordConstraint};
pub use input::{PopulationType, SearchAttribute, SearchDirectoryInput};
pub use name_analyzer::NameAnalyzer;
pub use query_generator::{GeneratedQuery, NameQueries, QueryGenerator, QueryTemplate, WildcardFormat};
pub use reducer::{BucketMap, NameQueryAnalyzer, ReductionMode, ResultBucket, ResultReducer};
pub use service::{DirectorySearchService, SearchOutput};
pub use synchronizer::{query_digest, QueryStatus, QuerySynchronizer, StatusGuard};
