mod cache_tests;
mod decision_tests;
mod expression_tests;

use handan::{ContextMap, Value};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Builds an evaluation context from a JSON object.
pub fn context(json: serde_json::Value) -> ContextMap {
    match Value::from(json) {
        Value::Context(map) => map,
        other => panic!("expected a JSON object, got {}", other.type_name()),
    }
}
