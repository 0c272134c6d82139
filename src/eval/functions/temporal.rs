use chrono::{Datelike, NaiveDate, NaiveTime};

use super::{expect_integer, expect_string, Arity, FunctionDef};
use crate::eval::evaluator::{EvalError, EvalResult};
use crate::eval::temporal::{self, Duration};
use crate::eval::value::Value;

pub fn definitions() -> Vec<FunctionDef> {
    vec![
        FunctionDef::new("date", Arity::Range(1, 3), date).propagating_null(),
        FunctionDef::new("time", Arity::Range(1, 3), time).propagating_null(),
        FunctionDef::new("date_and_time", Arity::Range(1, 2), date_and_time).propagating_null(),
        FunctionDef::new("duration", Arity::Exact(1), |args| {
            temporal::parse_duration(expect_string("duration", args, 0)?).map(Value::Duration)
        })
        .propagating_null(),
        FunctionDef::new(
            "years_and_months_duration",
            Arity::Exact(2),
            |args| {
                let from = calendar_date("years_and_months_duration", &args[0])?;
                let to = calendar_date("years_and_months_duration", &args[1])?;
                Ok(Value::Duration(Duration::from_months(
                    temporal::months_between(to, from),
                )))
            },
        )
        .propagating_null(),
        FunctionDef::new("day_of_week", Arity::Exact(1), |args| {
            let date = calendar_date("day_of_week", &args[0])?;
            Ok(Value::string(weekday_name(date)))
        })
        .propagating_null(),
    ]
}

/// `date("2024-01-31")`, `date(year, month, day)` or the date part of a date-time.
fn date(args: &[Value]) -> EvalResult<Value> {
    match args {
        [Value::String(s)] => temporal::parse_date(s).map(Value::Date),
        [Value::DateTime(dt)] => Ok(Value::Date(dt.date())),
        [Value::Date(d)] => Ok(Value::Date(*d)),
        [_, _, _] => {
            let (year, month, day) = (
                expect_integer("date", args, 0)?,
                expect_integer("date", args, 1)?,
                expect_integer("date", args, 2)?,
            );
            i32::try_from(year)
                .ok()
                .zip(u32::try_from(month).ok())
                .zip(u32::try_from(day).ok())
                .and_then(|((y, m), d)| NaiveDate::from_ymd_opt(y, m, d))
                .map(Value::Date)
                .ok_or_else(|| EvalError::InvalidTemporal {
                    kind: "date",
                    text: format!("{}-{}-{}", year, month, day),
                })
        }
        _ => Err(EvalError::invalid_argument(
            "date",
            "expected a string, a date and time, or year, month and day",
        )),
    }
}

/// `time("13:45:00")`, `time(hour, minute, second)` or the time part of a date-time.
fn time(args: &[Value]) -> EvalResult<Value> {
    match args {
        [Value::String(s)] => temporal::parse_time(s).map(Value::Time),
        [Value::DateTime(dt)] => Ok(Value::Time(dt.time())),
        [Value::Time(t)] => Ok(Value::Time(*t)),
        [_, _, _] => {
            let (hour, minute) = (
                expect_integer("time", args, 0)?,
                expect_integer("time", args, 1)?,
            );
            let second = match &args[2] {
                Value::Number(n) => *n,
                other => {
                    return Err(EvalError::invalid_argument(
                        "time",
                        format!("argument 3 must be number, got {}", other.type_name()),
                    ))
                }
            };
            let nanos = (second.fract() * 1e9).round() as u32;
            u32::try_from(hour)
                .ok()
                .zip(u32::try_from(minute).ok())
                .and_then(|(h, m)| NaiveTime::from_hms_nano_opt(h, m, second.trunc() as u32, nanos))
                .map(Value::Time)
                .ok_or_else(|| EvalError::InvalidTemporal {
                    kind: "time",
                    text: format!("{}:{}:{}", hour, minute, second),
                })
        }
        _ => Err(EvalError::invalid_argument(
            "time",
            "expected a string, a date and time, or hour, minute and second",
        )),
    }
}

/// `date_and_time("2024-01-31T08:00:00")` or `date_and_time(date, time)`.
fn date_and_time(args: &[Value]) -> EvalResult<Value> {
    match args {
        [Value::String(s)] => temporal::parse_date_time(s).map(Value::DateTime),
        [Value::DateTime(dt)] => Ok(Value::DateTime(*dt)),
        [Value::Date(d), Value::Time(t)] => Ok(Value::DateTime(d.and_time(*t))),
        [Value::DateTime(dt), Value::Time(t)] => Ok(Value::DateTime(dt.date().and_time(*t))),
        _ => Err(EvalError::invalid_argument(
            "date_and_time",
            "expected a string, or a date and a time",
        )),
    }
}

fn calendar_date(function: &str, value: &Value) -> EvalResult<NaiveDate> {
    match value {
        Value::Date(d) => Ok(*d),
        Value::DateTime(dt) => Ok(dt.date()),
        other => Err(EvalError::invalid_argument(
            function,
            format!("expected a date, got {}", other.type_name()),
        )),
    }
}

fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}
