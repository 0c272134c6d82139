use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::debug;

use super::bounded::{BoundedCache, CacheStats};
use crate::config::CacheConfig;
use crate::decision::{DecisionResult, DecisionTable};
use crate::eval::ContextMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ResultKey {
    decision_id: String,
    fingerprint: u64,
    context_hash: u64,
}

struct CachedResult {
    context: ContextMap,
    result: DecisionResult,
}

/// Decision results keyed by table and context.
///
/// The key holds a hash of the context; a hit is only returned when the stored context is equal
/// to the requested one, so hash collisions fall through to a fresh evaluation.
pub struct ResultCache {
    cache: Option<BoundedCache<ResultKey, Arc<CachedResult>>>,
    capacity: usize,
}

impl ResultCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            cache: config.enabled.then(|| BoundedCache::from_config(config)),
            capacity: config.capacity,
        }
    }

    fn key(table: &DecisionTable, context: &ContextMap) -> ResultKey {
        let mut hasher = DefaultHasher::new();
        context.hash(&mut hasher);
        ResultKey {
            decision_id: table.id().to_string(),
            fingerprint: table.fingerprint(),
            context_hash: hasher.finish(),
        }
    }

    pub fn get(&self, table: &DecisionTable, context: &ContextMap) -> Option<DecisionResult> {
        let cache = self.cache.as_ref()?;
        let cached = cache
            .get(&Self::key(table, context))
            .filter(|cached| cached.context == *context);
        debug!(decision = table.id(), hit = cached.is_some(), "result cache lookup");
        cached.map(|cached| cached.result.clone())
    }

    pub fn insert(&self, table: &DecisionTable, context: &ContextMap, result: &DecisionResult) {
        if let Some(cache) = &self.cache {
            cache.insert(
                Self::key(table, context),
                Arc::new(CachedResult {
                    context: context.clone(),
                    result: result.clone(),
                }),
            );
        }
    }

    pub fn clear(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    pub fn stats(&self) -> CacheStats {
        match &self.cache {
            Some(cache) => cache.stats(),
            None => CacheStats {
                capacity: self.capacity,
                ..CacheStats::default()
            },
        }
    }
}
