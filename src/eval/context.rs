use super::value::{ContextMap, Value};

/// Variable bindings visible to an expression.
///
/// The root borrows the caller's context and is never written to. `for`, quantifiers, filters
/// and context literals push a frame holding their own bindings; a frame shadows its parents and
/// disappears with the expression that created it.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    Root(&'a ContextMap),
    Frame {
        bindings: &'a ContextMap,
        parent: &'a Scope<'a>,
    },
}

impl<'a> Scope<'a> {
    pub fn root(context: &'a ContextMap) -> Self {
        Scope::Root(context)
    }

    pub fn child<'b>(&'b self, bindings: &'b ContextMap) -> Scope<'b> {
        Scope::Frame {
            bindings,
            parent: self,
        }
    }

    /// Exact key lookup, innermost frame first.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        match self {
            Scope::Root(context) => context.get(key),
            Scope::Frame { bindings, parent } => bindings.get(key).or_else(|| parent.get(key)),
        }
    }

    /// Resolves a dotted path.
    ///
    /// The whole path is first tried as a single key, then split at each `.` from the right:
    /// the longest prefix that names a binding is taken and the remaining segments are walked as
    /// properties. An unresolved path is `Null`.
    pub fn resolve(&self, path: &str) -> Value {
        if let Some(value) = self.get(path) {
            return value.clone();
        }
        for (index, _) in path.rmatch_indices('.') {
            let (prefix, rest) = (&path[..index], &path[index + 1..]);
            if let Some(base) = self.get(prefix) {
                return rest
                    .split('.')
                    .fold(base.clone(), |value, key| value.property(key));
            }
        }
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(json: serde_json::Value) -> ContextMap {
        match Value::from(json) {
            Value::Context(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_compound_key_wins() {
        let ctx = context(serde_json::json!({
            "applicant.age": 30,
            "applicant": {"age": 40}
        }));
        let scope = Scope::root(&ctx);
        assert_eq!(scope.resolve("applicant.age"), Value::from(30.0));
    }

    #[test]
    fn test_nested_walk() {
        let ctx = context(serde_json::json!({
            "applicant": {"address": {"city": "Kyoto"}}
        }));
        let scope = Scope::root(&ctx);
        assert_eq!(scope.resolve("applicant.address.city"), Value::from("Kyoto"));
        assert_eq!(scope.resolve("applicant.address.zip"), Value::Null);
        assert_eq!(scope.resolve("missing.path"), Value::Null);
        assert_eq!(scope.resolve("missing"), Value::Null);
    }

    #[test]
    fn test_frames_shadow_parents() {
        let ctx = context(serde_json::json!({"x": 1, "y": 2}));
        let root = Scope::root(&ctx);
        let bindings: ContextMap = [("x", Value::from(10.0))].into_iter().collect();
        let inner = root.child(&bindings);
        assert_eq!(inner.resolve("x"), Value::from(10.0));
        assert_eq!(inner.resolve("y"), Value::from(2.0));
        assert_eq!(root.resolve("x"), Value::from(1.0));
    }
}
