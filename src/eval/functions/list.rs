use std::cmp::Ordering;

use super::{expect_integer, expect_list, list_or_items, position, Arity, FunctionDef};
use crate::eval::evaluator::{EvalError, EvalResult};
use crate::eval::value::Value;

pub fn definitions() -> Vec<FunctionDef> {
    vec![
        FunctionDef::new("count", Arity::Exact(1), |args| {
            Ok(Value::Number(expect_list("count", args, 0)?.len() as f64))
        })
        .propagating_null(),
        FunctionDef::new("min", Arity::Variadic(1), |args| {
            extreme("min", list_or_items(args), Ordering::Less)
        }),
        FunctionDef::new("max", Arity::Variadic(1), |args| {
            extreme("max", list_or_items(args), Ordering::Greater)
        }),
        FunctionDef::new("sum", Arity::Variadic(1), |args| {
            Ok(numbers("sum", list_or_items(args))?
                .map(|ns| Value::Number(ns.iter().sum()))
                .unwrap_or_default())
        }),
        FunctionDef::new("mean", Arity::Variadic(1), |args| {
            Ok(numbers("mean", list_or_items(args))?
                .map(|ns| Value::Number(ns.iter().sum::<f64>() / ns.len() as f64))
                .unwrap_or_default())
        }),
        FunctionDef::new("product", Arity::Variadic(1), |args| {
            Ok(numbers("product", list_or_items(args))?
                .map(|ns| Value::Number(ns.iter().product()))
                .unwrap_or_default())
        }),
        FunctionDef::new("median", Arity::Variadic(1), |args| {
            Ok(numbers("median", list_or_items(args))?.map(|mut ns| {
                ns.sort_by(f64::total_cmp);
                let mid = ns.len() / 2;
                Value::Number(if ns.len() % 2 == 0 {
                    (ns[mid - 1] + ns[mid]) / 2.0
                } else {
                    ns[mid]
                })
            })
            .unwrap_or_default())
        }),
        FunctionDef::new("list_contains", Arity::Exact(2), |args| match &args[0] {
            Value::Null => Ok(Value::Null),
            _ => Ok(Value::Boolean(
                expect_list("list_contains", args, 0)?.contains(&args[1]),
            )),
        }),
        FunctionDef::new("append", Arity::Variadic(1), |args| match &args[0] {
            Value::Null => Ok(Value::Null),
            _ => {
                let mut items = expect_list("append", args, 0)?.to_vec();
                items.extend_from_slice(&args[1..]);
                Ok(Value::List(items))
            }
        }),
        FunctionDef::new("concatenate", Arity::Variadic(0), |args| {
            let mut items = Vec::new();
            for index in 0..args.len() {
                items.extend_from_slice(expect_list("concatenate", args, index)?);
            }
            Ok(Value::List(items))
        })
        .propagating_null(),
        FunctionDef::new("reverse", Arity::Exact(1), |args| {
            let mut items = expect_list("reverse", args, 0)?.to_vec();
            items.reverse();
            Ok(Value::List(items))
        })
        .propagating_null(),
        FunctionDef::new("index_of", Arity::Exact(2), |args| {
            let items = expect_list("index_of", args, 0)?;
            Ok(Value::List(
                items
                    .iter()
                    .enumerate()
                    .filter(|(_, item)| **item == args[1])
                    .map(|(i, _)| Value::Number((i + 1) as f64))
                    .collect(),
            ))
        }),
        FunctionDef::new("distinct_values", Arity::Exact(1), |args| {
            Ok(Value::List(distinct(
                expect_list("distinct_values", args, 0)?.iter(),
            )))
        })
        .propagating_null(),
        FunctionDef::new("union", Arity::Variadic(0), |args| {
            let mut lists = Vec::with_capacity(args.len());
            for index in 0..args.len() {
                lists.push(expect_list("union", args, index)?);
            }
            Ok(Value::List(distinct(lists.into_iter().flatten())))
        })
        .propagating_null(),
        FunctionDef::new("flatten", Arity::Exact(1), |args| {
            let mut items = Vec::new();
            flatten_into(expect_list("flatten", args, 0)?, &mut items);
            Ok(Value::List(items))
        })
        .propagating_null(),
        FunctionDef::new("sort", Arity::Exact(1), |args| {
            let mut items = expect_list("sort", args, 0)?.to_vec();
            let mut incomparable = None;
            items.sort_by(|a, b| {
                a.compare(b).unwrap_or_else(|| {
                    incomparable.get_or_insert_with(|| (a.type_name(), b.type_name()));
                    Ordering::Equal
                })
            });
            match incomparable {
                Some((a, b)) => Err(EvalError::TypeMismatch(format!(
                    "sort cannot order {} against {}",
                    a, b
                ))),
                None => Ok(Value::List(items)),
            }
        })
        .propagating_null(),
        FunctionDef::new("sublist", Arity::Range(2, 3), sublist).propagating_null(),
    ]
}

/// Numbers of an aggregate's input; `None` when it is empty or holds a null.
fn numbers(function: &str, items: &[Value]) -> EvalResult<Option<Vec<f64>>> {
    if items.is_empty() || items.iter().any(Value::is_null) {
        return Ok(None);
    }
    items
        .iter()
        .map(|item| match item {
            Value::Number(n) => Ok(*n),
            other => Err(EvalError::invalid_argument(
                function,
                format!("expected numbers, got {}", other.type_name()),
            )),
        })
        .collect::<EvalResult<Vec<_>>>()
        .map(Some)
}

fn extreme(function: &str, items: &[Value], wanted: Ordering) -> EvalResult<Value> {
    if items.iter().any(Value::is_null) {
        return Ok(Value::Null);
    }
    let mut best: Option<&Value> = None;
    for item in items {
        best = match best {
            None => Some(item),
            Some(current) => match item.compare(current) {
                Some(ordering) if ordering == wanted => Some(item),
                Some(_) => Some(current),
                None => {
                    return Err(EvalError::TypeMismatch(format!(
                        "{} cannot order {} against {}",
                        function,
                        item.type_name(),
                        current.type_name()
                    )))
                }
            },
        };
    }
    Ok(best.cloned().unwrap_or_default())
}

fn distinct<'a>(items: impl Iterator<Item = &'a Value>) -> Vec<Value> {
    let mut unique: Vec<Value> = Vec::new();
    for item in items {
        if !unique.contains(item) {
            unique.push(item.clone());
        }
    }
    unique
}

fn flatten_into(items: &[Value], out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::List(inner) => flatten_into(inner, out),
            other => out.push(other.clone()),
        }
    }
}

/// `sublist(list, start position, length?)`.
fn sublist(args: &[Value]) -> EvalResult<Value> {
    let items = expect_list("sublist", args, 0)?;
    let start = position("sublist", expect_integer("sublist", args, 1)?, items.len())?;
    let end = match args.get(2) {
        Some(_) => {
            let length = expect_integer("sublist", args, 2)?;
            if length < 0 {
                return Err(EvalError::invalid_argument(
                    "sublist",
                    "length must not be negative",
                ));
            }
            (start + length as usize).min(items.len())
        }
        None => items.len(),
    };
    Ok(Value::List(
        items.get(start..end).unwrap_or_default().to_vec(),
    ))
}
