use core::fmt;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Serialize, Serializer};

use super::evaluator::{EvalError, EvalResult};
use super::temporal::Duration;

/// Upper bound on the integers a range may expand to when iterated.
pub const MAX_RANGE_ITEMS: i64 = 1_000_000;

const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

// 値の型システム
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Duration(Duration),
    List(Vec<Value>),
    Context(ContextMap),
    Range(Box<RangeValue>),
}

/// Insertion-ordered string keyed map.
///
/// Equality ignores order: two contexts are equal when they hold the same keys with equal
/// values.
#[derive(Clone, Debug, Default)]
pub struct ContextMap {
    entries: Vec<(String, Value)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RangeValue {
    pub start: Value,
    pub end: Value,
    pub start_included: bool,
    pub end_included: bool,
}

impl ContextMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Replaces in place when the key exists, appends otherwise.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.entries.iter_mut().find(|(name, _)| *name == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for ContextMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for ContextMap {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        let mut map = ContextMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for ContextMap {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl RangeValue {
    /// `None` when the value cannot be ordered against a bound, `Some(Null)` semantics are left
    /// to the caller.
    pub fn contains(&self, value: &Value) -> Option<bool> {
        let above_start = match value.compare(&self.start)? {
            Ordering::Greater => true,
            Ordering::Equal => self.start_included,
            Ordering::Less => false,
        };
        let below_end = match value.compare(&self.end)? {
            Ordering::Less => true,
            Ordering::Equal => self.end_included,
            Ordering::Greater => false,
        };
        Some(above_start && below_end)
    }

    /// Integers covered by a range with integral number bounds, honoring inclusivity.
    ///
    /// `Ok(None)` when the bounds are not integral numbers. A range covering more than
    /// [`MAX_RANGE_ITEMS`] integers is an [`EvalError::Overflow`].
    pub fn integers(&self) -> EvalResult<Option<Vec<Value>>> {
        let (Value::Number(start), Value::Number(end)) = (&self.start, &self.end) else {
            return Ok(None);
        };
        if start.fract() != 0.0 || end.fract() != 0.0 {
            return Ok(None);
        }
        let too_large = || {
            EvalError::Overflow(format!(
                "range {}..{} covers more than {} integers",
                self.start, self.end, MAX_RANGE_ITEMS
            ))
        };
        // integral f64 values are exact up to 2^53, so the arithmetic below stays in i64
        if start.abs() > MAX_EXACT_INTEGER || end.abs() > MAX_EXACT_INTEGER {
            return Err(too_large());
        }
        let (start, end) = (*start as i64, *end as i64);
        let step = if start <= end { 1 } else { -1 };
        let first = if self.start_included { start } else { start + step };
        let last = if self.end_included { end } else { end - step };
        let span = (last - first) * step;
        if span < 0 {
            return Ok(Some(Vec::new()));
        }
        if span >= MAX_RANGE_ITEMS {
            return Err(too_large());
        }
        Ok(Some(
            (0..=span)
                .map(|i| Value::Number((first + i * step) as f64))
                .collect(),
        ))
    }
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn range(start: Value, end: Value, start_included: bool, end_included: bool) -> Self {
        Value::Range(Box::new(RangeValue {
            start,
            end,
            start_included,
            end_included,
        }))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "date_and_time",
            Value::Duration(_) => "duration",
            Value::List(_) => "list",
            Value::Context(_) => "context",
            Value::Range(_) => "range",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Ordering between two values of the same ordered type.
    ///
    /// Numbers, strings, dates, times, date-times and durations of the same kind are ordered.
    /// Everything else, including booleans and any cross-type pair, is `None`.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Number(l), Value::Number(r)) => l.partial_cmp(r),
            (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
            (Value::Date(l), Value::Date(r)) => Some(l.cmp(r)),
            (Value::Time(l), Value::Time(r)) => Some(l.cmp(r)),
            (Value::DateTime(l), Value::DateTime(r)) => Some(l.cmp(r)),
            (Value::Duration(l), Value::Duration(r)) => l.partial_cmp_duration(r),
            _ => None,
        }
    }

    /// Member of a value by name. Anything that does not resolve is `Null`.
    pub fn property(&self, key: &str) -> Value {
        match self {
            Value::Context(map) => map.get(key).cloned().unwrap_or_default(),
            Value::Date(date) => date_property(date, key).unwrap_or_default(),
            Value::Time(time) => time_property(time, key).unwrap_or_default(),
            Value::DateTime(value) => date_property(&value.date(), key)
                .or_else(|| time_property(&value.time(), key))
                .unwrap_or_default(),
            Value::Duration(duration) => match key {
                "years" => Value::Number(duration.years() as f64),
                "months" => Value::Number((duration.months % 12) as f64),
                "days" => Value::Number(duration.days() as f64),
                "hours" => Value::Number(duration.hours() as f64),
                "minutes" => Value::Number(duration.minutes() as f64),
                "seconds" => Value::Number(duration.seconds()),
                _ => Value::Null,
            },
            Value::Range(range) => match key {
                "start" => range.start.clone(),
                "end" => range.end.clone(),
                "start_included" => Value::Boolean(range.start_included),
                "end_included" => Value::Boolean(range.end_included),
                _ => Value::Null,
            },
            _ => Value::Null,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9.0e15 {
                    serde_json::Value::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null)
                }
            }
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Date(_) | Value::Time(_) | Value::DateTime(_) | Value::Duration(_) => {
                serde_json::Value::String(self.to_string())
            }
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Context(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            Value::Range(range) => serde_json::json!({
                "start": range.start.to_json(),
                "end": range.end.to_json(),
                "start_included": range.start_included,
                "end_included": range.end_included,
            }),
        }
    }
}

fn date_property(date: &NaiveDate, key: &str) -> Option<Value> {
    let n = match key {
        "year" => date.year() as f64,
        "month" => date.month() as f64,
        "day" => date.day() as f64,
        "weekday" => date.weekday().number_from_monday() as f64,
        _ => return None,
    };
    Some(Value::Number(n))
}

fn time_property(time: &NaiveTime, key: &str) -> Option<Value> {
    let n = match key {
        "hour" => time.hour() as f64,
        "minute" => time.minute() as f64,
        "second" => time.second() as f64 + time.nanosecond() as f64 / 1e9,
        _ => return None,
    };
    Some(Value::Number(n))
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => n.as_f64().map(Value::Number).unwrap_or_default(),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Context(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<ContextMap> for Value {
    fn from(map: ContextMap) -> Self {
        Value::Context(map)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl Serialize for ContextMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Consistent with `==`: numbers hash by normalized bit pattern, contexts ignore key order.
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::Number(n) => {
                let n = if *n == 0.0 { 0.0 } else { *n };
                n.to_bits().hash(state)
            }
            Value::String(s) => s.hash(state),
            Value::Date(d) => d.hash(state),
            Value::Time(t) => t.hash(state),
            Value::DateTime(dt) => dt.hash(state),
            Value::Duration(d) => d.hash(state),
            Value::List(items) => items.hash(state),
            Value::Context(map) => map.hash(state),
            Value::Range(range) => {
                range.start.hash(state);
                range.end.hash(state);
                range.start_included.hash(state);
                range.end_included.hash(state);
            }
        }
    }
}

impl Hash for ContextMap {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries.len().hash(state);
        for (key, value) in entries {
            key.hash(state);
            value.hash(state);
        }
    }
}

fn fmt_number(n: f64, f: &mut fmt::Formatter) -> fmt::Result {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{}", n)
    }
}

fn fmt_nested(value: &Value, f: &mut fmt::Formatter) -> fmt::Result {
    match value {
        Value::String(s) => write!(f, "{:?}", s),
        _ => write!(f, "{}", value),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => fmt_number(*n, f),
            Value::String(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Duration(d) => write!(f, "{}", d),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    fmt_nested(item, f)?;
                }
                write!(f, "]")
            }
            Value::Context(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: ", key)?;
                    fmt_nested(value, f)?;
                }
                write!(f, "}}")
            }
            Value::Range(range) => {
                write!(f, "{}", if range.start_included { '[' } else { '(' })?;
                fmt_nested(&range.start, f)?;
                write!(f, "..")?;
                fmt_nested(&range.end, f)?;
                write!(f, "{}", if range.end_included { ']' } else { ')' })
            }
        }
    }
}
