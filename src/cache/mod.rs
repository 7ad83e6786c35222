//! Cache Module
//!
//! Thread-safe bounded LRU cache kept in front of the key-value table.

mod lru;
mod stats;
mod store;


// Re-export public types
pub use stats::CacheStats;
pub use store::LruCache;
