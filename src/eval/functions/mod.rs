//! # Built-in functions
//!
//! Every function is registered in a [`FunctionRegistry`] under a snake_case name together with
//! its [`Arity`]. The registry checks arity before dispatch; each function checks its argument
//! types and reports [`EvalError::InvalidArgument`] on a mismatch. Functions are pure.
//!
//! | module | functions |
//! |---|---|
//! | `string` | `substring`, `string_length`, `upper_case`, `matches`, `replace`, ... |
//! | `numeric` | `abs`, `floor`, `ceiling`, `decimal`, `round`, `modulo`, ... |
//! | `list` | `count`, `min`, `max`, `sum`, `sort`, `sublist`, ... |
//! | `boolean` | `all`, `any`, `is_null` |
//! | `temporal` | `date`, `time`, `date_and_time`, `duration`, ... |

pub mod boolean;
pub mod list;
pub mod numeric;
pub mod registry;
pub mod string;
pub mod temporal;

pub use registry::{Arity, FunctionDef, FunctionRegistry, NativeFunction, RegistryError};

use super::evaluator::{EvalError, EvalResult};
use super::value::Value;

pub(crate) fn expect_string<'a>(function: &str, args: &'a [Value], index: usize) -> EvalResult<&'a str> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s),
        other => Err(wrong_type(function, "string", index, other)),
    }
}

pub(crate) fn expect_number(function: &str, args: &[Value], index: usize) -> EvalResult<f64> {
    match args.get(index) {
        Some(Value::Number(n)) => Ok(*n),
        other => Err(wrong_type(function, "number", index, other)),
    }
}

pub(crate) fn expect_integer(function: &str, args: &[Value], index: usize) -> EvalResult<i64> {
    let n = expect_number(function, args, index)?;
    if n.fract() != 0.0 {
        return Err(EvalError::invalid_argument(
            function,
            format!("argument {} must be an integer, got {}", index + 1, n),
        ));
    }
    Ok(n as i64)
}

pub(crate) fn expect_list<'a>(
    function: &str,
    args: &'a [Value],
    index: usize,
) -> EvalResult<&'a [Value]> {
    match args.get(index) {
        Some(Value::List(items)) => Ok(items),
        other => Err(wrong_type(function, "list", index, other)),
    }
}

/// The items of a function that takes either one list or the items themselves.
pub(crate) fn list_or_items(args: &[Value]) -> &[Value] {
    match args {
        [Value::List(items)] => items,
        _ => args,
    }
}

fn wrong_type(function: &str, expected: &str, index: usize, found: Option<&Value>) -> EvalError {
    EvalError::invalid_argument(
        function,
        format!(
            "argument {} must be {}, got {}",
            index + 1,
            expected,
            found.map(Value::type_name).unwrap_or("nothing")
        ),
    )
}

/// Converts a 1-based, possibly negative position into a 0-based index.
pub(crate) fn position(function: &str, position: i64, len: usize) -> EvalResult<usize> {
    let index = if position > 0 {
        position - 1
    } else {
        len as i64 + position
    };
    if position == 0 || index < 0 || index as usize >= len.max(1) {
        return Err(EvalError::invalid_argument(
            function,
            format!("position {} is out of bounds", position),
        ));
    }
    Ok(index as usize)
}
