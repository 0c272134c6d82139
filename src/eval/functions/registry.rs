use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use crate::eval::evaluator::{EvalError, EvalResult};
use crate::eval::value::Value;

use super::{boolean, list, numeric, string, temporal};

pub type NativeFunction = Arc<dyn Fn(&[Value]) -> EvalResult<Value> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Inclusive bounds.
    Range(usize, usize),
    /// At least this many.
    Variadic(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == *n,
            Arity::Range(min, max) => (*min..=*max).contains(&count),
            Arity::Variadic(min) => count >= *min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::Range(min, max) => write!(f, "{} to {}", min, max),
            Arity::Variadic(min) => write!(f, "at least {}", min),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("function already registered: {0}")]
    Duplicate(String),
    #[error("invalid signature for {name:?}: {message}")]
    InvalidSignature { name: String, message: String },
}

/// A named function callable from expressions.
#[derive(Clone)]
pub struct FunctionDef {
    pub name: String,
    pub arity: Arity,
    /// When set, a call with any null argument returns null without running the function.
    pub propagates_null: bool,
    function: NativeFunction,
}

impl fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("propagates_null", &self.propagates_null)
            .finish()
    }
}

impl FunctionDef {
    pub fn new<F>(name: impl Into<String>, arity: Arity, function: F) -> Self
    where
        F: Fn(&[Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            propagates_null: false,
            function: Arc::new(function),
        }
    }

    pub fn propagating_null(mut self) -> Self {
        self.propagates_null = true;
        self
    }

    fn validate(&self) -> Result<(), RegistryError> {
        let invalid = |message: &str| RegistryError::InvalidSignature {
            name: self.name.clone(),
            message: message.to_string(),
        };
        let mut chars = self.name.chars();
        match chars.next() {
            None => return Err(invalid("empty name")),
            Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
                return Err(invalid("name must start with a letter or `_`"))
            }
            _ => {}
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid("name must be an identifier"));
        }
        if let Arity::Range(min, max) = self.arity {
            if min > max {
                return Err(invalid("arity range is empty"));
            }
        }
        Ok(())
    }

    pub fn call(&self, args: &[Value]) -> EvalResult<Value> {
        if !self.arity.accepts(args.len()) {
            return Err(EvalError::ArityMismatch {
                name: self.name.clone(),
                expected: self.arity.to_string(),
                actual: args.len(),
            });
        }
        if self.propagates_null && args.iter().any(Value::is_null) {
            return Ok(Value::Null);
        }
        (self.function)(args)
    }
}

/// Functions available to expressions, keyed by name.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: DashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the string, numeric, list, boolean and date/time built-ins.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for def in string::definitions()
            .into_iter()
            .chain(numeric::definitions())
            .chain(list::definitions())
            .chain(boolean::definitions())
            .chain(temporal::definitions())
        {
            registry.functions.insert(def.name.clone(), def);
        }
        registry
    }

    pub fn register(&self, def: FunctionDef) -> Result<(), RegistryError> {
        def.validate()?;
        match self.functions.entry(def.name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(RegistryError::Duplicate(def.name)),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                debug!(name = %def.name, arity = %def.arity, "registered function");
                entry.insert(def);
                Ok(())
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn call(&self, name: &str, args: &[Value]) -> EvalResult<Value> {
        // clone out of the map so no shard lock is held while the function runs
        let def = self
            .functions
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
        def.call(args)
    }
}
