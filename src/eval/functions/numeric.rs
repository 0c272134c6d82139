use super::{expect_integer, expect_number, Arity, FunctionDef};
use crate::eval::evaluator::{EvalError, EvalResult};
use crate::eval::value::Value;

pub fn definitions() -> Vec<FunctionDef> {
    vec![
        FunctionDef::new("abs", Arity::Exact(1), |args| {
            Ok(Value::Number(expect_number("abs", args, 0)?.abs()))
        })
        .propagating_null(),
        FunctionDef::new("floor", Arity::Exact(1), |args| {
            Ok(Value::Number(expect_number("floor", args, 0)?.floor()))
        })
        .propagating_null(),
        FunctionDef::new("ceiling", Arity::Exact(1), |args| {
            Ok(Value::Number(expect_number("ceiling", args, 0)?.ceil()))
        })
        .propagating_null(),
        FunctionDef::new("decimal", Arity::Exact(2), |args| {
            let n = expect_number("decimal", args, 0)?;
            let scale = expect_integer("decimal", args, 1)?;
            Ok(Value::Number(at_scale(n, scale, round_half_even)))
        })
        .propagating_null(),
        FunctionDef::new("round", Arity::Range(1, 2), |args| {
            let n = expect_number("round", args, 0)?;
            let scale = match args.get(1) {
                Some(_) => expect_integer("round", args, 1)?,
                None => 0,
            };
            Ok(Value::Number(at_scale(n, scale, f64::round)))
        })
        .propagating_null(),
        FunctionDef::new("modulo", Arity::Exact(2), |args| {
            modulo(
                expect_number("modulo", args, 0)?,
                expect_number("modulo", args, 1)?,
            )
            .map(Value::Number)
        })
        .propagating_null(),
        FunctionDef::new("sqrt", Arity::Exact(1), |args| {
            let n = expect_number("sqrt", args, 0)?;
            if n < 0.0 {
                return Err(EvalError::invalid_argument("sqrt", "negative operand"));
            }
            Ok(Value::Number(n.sqrt()))
        })
        .propagating_null(),
        FunctionDef::new("number", Arity::Exact(1), |args| match &args[0] {
            Value::Number(n) => Ok(Value::Number(*n)),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Value::Number)
                .ok_or_else(|| {
                    EvalError::invalid_argument("number", format!("not a number: {:?}", s))
                }),
            other => Err(EvalError::invalid_argument(
                "number",
                format!("cannot convert {} to number", other.type_name()),
            )),
        })
        .propagating_null(),
        FunctionDef::new("odd", Arity::Exact(1), |args| {
            Ok(Value::Boolean(expect_integer("odd", args, 0)? % 2 != 0))
        })
        .propagating_null(),
        FunctionDef::new("even", Arity::Exact(1), |args| {
            Ok(Value::Boolean(expect_integer("even", args, 0)? % 2 == 0))
        })
        .propagating_null(),
    ]
}

/// Remainder with the sign of the divisor, shared with the `%` operator.
pub fn modulo(dividend: f64, divisor: f64) -> EvalResult<f64> {
    if divisor == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(dividend - divisor * (dividend / divisor).floor())
}

fn at_scale(n: f64, scale: i64, round: fn(f64) -> f64) -> f64 {
    let factor = 10f64.powi(scale.clamp(-308, 308) as i32);
    round(n * factor) / factor
}

fn round_half_even(x: f64) -> f64 {
    let rounded = x.round();
    if (rounded - x).abs() == 0.5 && rounded % 2.0 != 0.0 {
        rounded - x.signum()
    } else {
        rounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::functions::FunctionRegistry;

    fn call(name: &str, args: Vec<Value>) -> EvalResult<Value> {
        FunctionRegistry::with_builtins().call(name, &args)
    }

    #[test]
    fn test_rounding() {
        assert_eq!(call("decimal", vec![2.5.into(), 0.0.into()]).unwrap(), 2.0.into());
        assert_eq!(call("decimal", vec![3.5.into(), 0.0.into()]).unwrap(), 4.0.into());
        assert_eq!(call("decimal", vec![(-2.5).into(), 0.0.into()]).unwrap(), (-2.0).into());
        assert_eq!(call("round", vec![2.5.into()]).unwrap(), 3.0.into());
        assert_eq!(call("round", vec![1.256.into(), 2.0.into()]).unwrap(), 1.26.into());
        assert_eq!(call("floor", vec![(-1.5).into()]).unwrap(), (-2.0).into());
        assert_eq!(call("ceiling", vec![1.2.into()]).unwrap(), 2.0.into());
    }

    #[test]
    fn test_modulo_sign_follows_divisor() {
        assert_eq!(modulo(12.0, 5.0), Ok(2.0));
        assert_eq!(modulo(-12.0, 5.0), Ok(3.0));
        assert_eq!(modulo(12.0, -5.0), Ok(-3.0));
        assert_eq!(modulo(1.0, 0.0), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn test_conversions_and_parity() {
        assert_eq!(call("number", vec![" 12.5 ".into()]).unwrap(), 12.5.into());
        assert!(call("number", vec!["twelve".into()]).is_err());
        assert_eq!(call("odd", vec![3.0.into()]).unwrap(), true.into());
        assert_eq!(call("even", vec![3.0.into()]).unwrap(), false.into());
        assert!(call("even", vec![2.5.into()]).is_err());
        assert!(call("sqrt", vec![(-1.0).into()]).is_err());
        assert_eq!(call("abs", vec![Value::Null]).unwrap(), Value::Null);
    }
}
