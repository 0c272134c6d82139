use super::{list_or_items, Arity, FunctionDef};
use crate::eval::value::Value;

pub fn definitions() -> Vec<FunctionDef> {
    vec![
        // false if any item is false, null if any item is not a boolean, true otherwise
        FunctionDef::new("all", Arity::Variadic(1), |args| {
            let items = list_or_items(args);
            if items.iter().any(|item| item.as_bool() == Some(false)) {
                return Ok(Value::Boolean(false));
            }
            Ok(match items.iter().all(|item| item.as_bool().is_some()) {
                true => Value::Boolean(true),
                false => Value::Null,
            })
        }),
        FunctionDef::new("any", Arity::Variadic(1), |args| {
            let items = list_or_items(args);
            if items.iter().any(|item| item.as_bool() == Some(true)) {
                return Ok(Value::Boolean(true));
            }
            Ok(match items.iter().all(|item| item.as_bool().is_some()) {
                true => Value::Boolean(false),
                false => Value::Null,
            })
        }),
        FunctionDef::new("is_null", Arity::Exact(1), |args| {
            Ok(Value::Boolean(args[0].is_null()))
        }),
    ]
}
