//! Page cache module for storing fetched trip planner pages on disk
//!
//! Every freshly fetched page is written here before it is parsed, one HTML
//! file per cache key. Entries never expire; delete the files to invalidate.

mod page;

pub use page::{default_cache_dir, CacheKey, CacheKeyPolicy, PageCache};
