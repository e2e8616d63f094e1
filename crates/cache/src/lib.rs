//! Context-scoped caching for trellis
//!
//! This crate provides the in-memory cache used to avoid recomputing module
//! versions within a single run:
//! - Path-like composite keys ([`CacheKey`])
//! - Deterministic context fingerprints ([`CacheContext`])
//! - A thread-safe store whose hits require an exact context match ([`ContextCache`])
//!
//! # Invalidation
//!
//! The key space does not change when a context changes. A lookup under a
//! context that differs from the stored one is a miss; the stale entry stays
//! in place until it is overwritten or explicitly invalidated.
//!
//! # Example
//!
//! ```
//! use trellis_cache::{CacheContext, CacheKey, ContextCache};
//!
//! let cache = ContextCache::new();
//! let key = CacheKey::from(["moduleVersions", "module-a"]);
//! let context = CacheContext::new("abc123");
//!
//! cache.set(key.clone(), 42, context.clone());
//! assert_eq!(cache.get(&key, &context), Some(42));
//! assert_eq!(cache.get(&key, &CacheContext::new("other")), None);
//! ```

mod error;
mod key;
mod store;

// Re-export error types at crate root
pub use error::{Error, Result};

pub use key::{CacheContext, CacheKey};
pub use store::ContextCache;
