//! Bounded caches for parsed expressions and decision results.
//!
//! Both caches evict the oldest insertion when full, treat entries past their ttl as absent and
//! count hits and misses. They are owned by a [`DecisionEngine`](crate::decision::DecisionEngine)
//! and never shared process-wide. Caching never changes a result.

pub mod bounded;
pub mod expression;
pub mod result;

pub use bounded::{BoundedCache, CacheStats};
pub use expression::ExpressionCache;
pub use result::ResultCache;
