use regex::Regex;

use super::{expect_integer, expect_list, expect_string, position, Arity, FunctionDef};
use crate::eval::evaluator::{EvalError, EvalResult};
use crate::eval::value::Value;

pub fn definitions() -> Vec<FunctionDef> {
    vec![
        FunctionDef::new("substring", Arity::Range(2, 3), substring).propagating_null(),
        FunctionDef::new("string_length", Arity::Exact(1), |args| {
            let s = expect_string("string_length", args, 0)?;
            Ok(Value::Number(s.chars().count() as f64))
        })
        .propagating_null(),
        FunctionDef::new("upper_case", Arity::Exact(1), |args| {
            Ok(Value::String(expect_string("upper_case", args, 0)?.to_uppercase()))
        })
        .propagating_null(),
        FunctionDef::new("lower_case", Arity::Exact(1), |args| {
            Ok(Value::String(expect_string("lower_case", args, 0)?.to_lowercase()))
        })
        .propagating_null(),
        FunctionDef::new("substring_before", Arity::Exact(2), |args| {
            let s = expect_string("substring_before", args, 0)?;
            let pattern = expect_string("substring_before", args, 1)?;
            Ok(Value::string(
                s.find(pattern).map(|at| &s[..at]).unwrap_or_default(),
            ))
        })
        .propagating_null(),
        FunctionDef::new("substring_after", Arity::Exact(2), |args| {
            let s = expect_string("substring_after", args, 0)?;
            let pattern = expect_string("substring_after", args, 1)?;
            Ok(Value::string(
                s.find(pattern)
                    .map(|at| &s[at + pattern.len()..])
                    .unwrap_or_default(),
            ))
        })
        .propagating_null(),
        FunctionDef::new("contains", Arity::Exact(2), |args| {
            let s = expect_string("contains", args, 0)?;
            Ok(Value::Boolean(s.contains(expect_string("contains", args, 1)?)))
        })
        .propagating_null(),
        FunctionDef::new("starts_with", Arity::Exact(2), |args| {
            let s = expect_string("starts_with", args, 0)?;
            Ok(Value::Boolean(s.starts_with(expect_string("starts_with", args, 1)?)))
        })
        .propagating_null(),
        FunctionDef::new("ends_with", Arity::Exact(2), |args| {
            let s = expect_string("ends_with", args, 0)?;
            Ok(Value::Boolean(s.ends_with(expect_string("ends_with", args, 1)?)))
        })
        .propagating_null(),
        FunctionDef::new("matches", Arity::Range(2, 3), |args| {
            let s = expect_string("matches", args, 0)?;
            Ok(Value::Boolean(compile("matches", args, 1)?.is_match(s)))
        })
        .propagating_null(),
        FunctionDef::new("replace", Arity::Range(3, 4), |args| {
            let s = expect_string("replace", args, 0)?;
            let pattern = compile_with_flags("replace", args, 1, 3)?;
            let replacement = expect_string("replace", args, 2)?;
            Ok(Value::string(pattern.replace_all(s, replacement)))
        })
        .propagating_null(),
        FunctionDef::new("split", Arity::Exact(2), |args| {
            let s = expect_string("split", args, 0)?;
            let delimiter = compile("split", args, 1)?;
            Ok(Value::List(delimiter.split(s).map(Value::from).collect()))
        })
        .propagating_null(),
        FunctionDef::new("string_join", Arity::Range(1, 2), string_join).propagating_null(),
        FunctionDef::new("trim", Arity::Exact(1), |args| {
            Ok(Value::string(expect_string("trim", args, 0)?.trim()))
        })
        .propagating_null(),
        FunctionDef::new("string", Arity::Exact(1), |args| {
            Ok(Value::String(args[0].to_string()))
        })
        .propagating_null(),
    ]
}

/// `substring(string, start position, length?)`, positions are 1-based and may be negative.
fn substring(args: &[Value]) -> EvalResult<Value> {
    let chars: Vec<char> = expect_string("substring", args, 0)?.chars().collect();
    let start = position("substring", expect_integer("substring", args, 1)?, chars.len())?;
    let end = match args.get(2) {
        Some(_) => {
            let length = expect_integer("substring", args, 2)?;
            if length < 0 {
                return Err(EvalError::invalid_argument(
                    "substring",
                    "length must not be negative",
                ));
            }
            (start + length as usize).min(chars.len())
        }
        None => chars.len(),
    };
    Ok(Value::String(
        chars.get(start..end).unwrap_or_default().iter().collect(),
    ))
}

fn string_join(args: &[Value]) -> EvalResult<Value> {
    let items = expect_list("string_join", args, 0)?;
    let delimiter = match args.get(1) {
        Some(_) => expect_string("string_join", args, 1)?,
        None => "",
    };
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Null => {}
            Value::String(s) => parts.push(s.as_str()),
            other => {
                return Err(EvalError::invalid_argument(
                    "string_join",
                    format!("list items must be strings, got {}", other.type_name()),
                ))
            }
        }
    }
    Ok(Value::String(parts.join(delimiter)))
}

fn compile(function: &str, args: &[Value], index: usize) -> EvalResult<Regex> {
    compile_with_flags(function, args, index, index + 1)
}

/// Builds the regex at `pattern_index`, applying the `flags` argument (`i`, `m`, `s`, `x`) when
/// present.
fn compile_with_flags(
    function: &str,
    args: &[Value],
    pattern_index: usize,
    flags_index: usize,
) -> EvalResult<Regex> {
    let pattern = expect_string(function, args, pattern_index)?;
    let flags = match args.get(flags_index) {
        Some(_) => expect_string(function, args, flags_index)?,
        None => "",
    };
    if let Some(flag) = flags.chars().find(|c| !"imsx".contains(*c)) {
        return Err(EvalError::invalid_argument(
            function,
            format!("unsupported regex flag `{}`", flag),
        ));
    }
    let source = if flags.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{}){}", flags, pattern)
    };
    Regex::new(&source).map_err(|e| EvalError::invalid_argument(function, e.to_string()))
}
