use std::sync::Arc;

use tracing::debug;

use super::bounded::{BoundedCache, CacheStats};
use crate::ast::{Expression, UnaryTests};
use crate::config::CacheConfig;
use crate::parser::{self, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Grammar {
    Expression,
    UnaryTests,
}

#[derive(Debug, Clone)]
enum Parsed {
    Expression(Arc<Expression>),
    UnaryTests(Arc<UnaryTests>),
}

/// Parsed syntax trees keyed by source text.
///
/// Only successful parses are stored. A disabled cache parses on every call.
pub struct ExpressionCache {
    cache: Option<BoundedCache<(Grammar, String), Parsed>>,
    capacity: usize,
}

impl ExpressionCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            cache: config.enabled.then(|| BoundedCache::from_config(config)),
            capacity: config.capacity,
        }
    }

    pub fn expression(&self, text: &str) -> Result<Arc<Expression>, ParseError> {
        let key = (Grammar::Expression, text.to_string());
        if let Some(Parsed::Expression(expression)) = self.lookup(&key) {
            return Ok(expression);
        }
        let expression = Arc::new(parser::parse_expression(text)?);
        self.store(key, Parsed::Expression(Arc::clone(&expression)));
        Ok(expression)
    }

    pub fn unary_tests(&self, text: &str) -> Result<Arc<UnaryTests>, ParseError> {
        let key = (Grammar::UnaryTests, text.to_string());
        if let Some(Parsed::UnaryTests(tests)) = self.lookup(&key) {
            return Ok(tests);
        }
        let tests = Arc::new(parser::parse_unary_tests(text)?);
        self.store(key, Parsed::UnaryTests(Arc::clone(&tests)));
        Ok(tests)
    }

    fn lookup(&self, key: &(Grammar, String)) -> Option<Parsed> {
        let parsed = self.cache.as_ref()?.get(key);
        debug!(text = %key.1, hit = parsed.is_some(), "ast cache lookup");
        parsed
    }

    fn store(&self, key: (Grammar, String), parsed: Parsed) {
        if let Some(cache) = &self.cache {
            cache.insert(key, parsed);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_once() {
        let cache = ExpressionCache::new(&CacheConfig::default());
        let first = cache.expression("a + 1").unwrap();
        let second = cache.expression("a + 1").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_grammars_do_not_alias() {
        let cache = ExpressionCache::new(&CacheConfig::default());
        cache.expression("1").unwrap();
        cache.unary_tests("1").unwrap();
        assert_eq!(cache.stats().size, 2);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = ExpressionCache::new(&CacheConfig::default());
        assert!(cache.expression("1 +").is_err());
        assert!(cache.expression("1 +").is_err());
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_disabled_cache() {
        let config = CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        };
        let cache = ExpressionCache::new(&config);
        let first = cache.expression("a").unwrap();
        let second = cache.expression("a").unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats().size, 0);
    }
}
