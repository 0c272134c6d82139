//! Date, time and duration text formats and arithmetic.
//!
//! * date: `YYYY-MM-DD`
//! * time: `hh:mm`, `hh:mm:ss`, `hh:mm:ss.fff`
//! * date and time: `<date>T<time>`
//! * duration: ISO-8601 `PnYnM` (years and months) or `PnDTnHnMn.nS` (days and time),
//!   optionally prefixed with `-`

use std::fmt;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::evaluator::{EvalError, EvalResult};

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

lazy_static! {
    static ref YEAR_MONTH_DURATION: Regex =
        Regex::new(r"^(-)?P(?:(\d+)Y)?(?:(\d+)M)?$").expect("valid duration pattern");
    static ref DAY_TIME_DURATION: Regex = Regex::new(
        r"^(-)?P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$"
    )
    .expect("valid duration pattern");
}

/// A duration made of a calendar part (months) and an exact part (milliseconds).
///
/// The two parts never mix in the text formats: `P1Y2M` yields `months = 14`,
/// `P1DT2H` yields `millis = 93_600_000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Duration {
    pub months: i64,
    pub millis: i64,
}

impl Duration {
    pub fn from_months(months: i64) -> Self {
        Self { months, millis: 0 }
    }

    pub fn from_millis(millis: i64) -> Self {
        Self { months: 0, millis }
    }

    pub fn is_year_month(&self) -> bool {
        self.millis == 0
    }

    pub fn is_day_time(&self) -> bool {
        self.months == 0
    }

    /// Only durations of the same kind are ordered; the zero duration is both kinds.
    pub fn partial_cmp_duration(&self, other: &Duration) -> Option<std::cmp::Ordering> {
        if self.is_day_time() && other.is_day_time() {
            Some(self.millis.cmp(&other.millis))
        } else if self.is_year_month() && other.is_year_month() {
            Some(self.months.cmp(&other.months))
        } else if self == other {
            Some(std::cmp::Ordering::Equal)
        } else {
            None
        }
    }

    pub fn checked_add(&self, other: &Duration) -> Option<Duration> {
        Some(Duration {
            months: self.months.checked_add(other.months)?,
            millis: self.millis.checked_add(other.millis)?,
        })
    }

    pub fn checked_negate(&self) -> Option<Duration> {
        Some(Duration {
            months: self.months.checked_neg()?,
            millis: self.millis.checked_neg()?,
        })
    }

    /// Both parts multiplied by `factor` and rounded; `None` when a part leaves the `i64` range.
    pub fn checked_scale(&self, factor: f64) -> Option<Duration> {
        Some(Duration {
            months: scale_part(self.months, factor)?,
            millis: scale_part(self.millis, factor)?,
        })
    }

    /// Total in the unit of the duration's kind, used for `duration / duration`.
    pub fn magnitude(&self) -> f64 {
        if self.is_day_time() {
            self.millis as f64
        } else {
            self.months as f64
        }
    }

    pub fn years(&self) -> i64 {
        self.months / 12
    }

    pub fn days(&self) -> i64 {
        self.millis / MILLIS_PER_DAY
    }

    pub fn hours(&self) -> i64 {
        (self.millis % MILLIS_PER_DAY) / MILLIS_PER_HOUR
    }

    pub fn minutes(&self) -> i64 {
        (self.millis % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE
    }

    pub fn seconds(&self) -> f64 {
        (self.millis % MILLIS_PER_MINUTE) as f64 / MILLIS_PER_SECOND as f64
    }
}

fn scale_part(value: i64, factor: f64) -> Option<i64> {
    let scaled = (value as f64 * factor).round();
    // `i64::MAX as f64` is 2^63, itself out of range
    (scaled.is_finite() && scaled >= i64::MIN as f64 && scaled < i64::MAX as f64)
        .then_some(scaled as i64)
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.months == 0 && self.millis == 0 {
            return write!(f, "PT0S");
        }
        let negative = self.months < 0 || self.millis < 0;
        let months = self.months.unsigned_abs();
        let millis = self.millis.unsigned_abs();
        let (second, minute, hour, day) = (
            MILLIS_PER_SECOND as u64,
            MILLIS_PER_MINUTE as u64,
            MILLIS_PER_HOUR as u64,
            MILLIS_PER_DAY as u64,
        );
        if negative {
            write!(f, "-")?;
        }
        write!(f, "P")?;
        if months / 12 > 0 {
            write!(f, "{}Y", months / 12)?;
        }
        if months % 12 > 0 {
            write!(f, "{}M", months % 12)?;
        }
        if millis / day > 0 {
            write!(f, "{}D", millis / day)?;
        }
        let rest = millis % day;
        if rest > 0 {
            write!(f, "T")?;
            let hours = rest / hour;
            let minutes = (rest % hour) / minute;
            let seconds = rest % minute;
            if hours > 0 {
                write!(f, "{}H", hours)?;
            }
            if minutes > 0 {
                write!(f, "{}M", minutes)?;
            }
            if seconds > 0 {
                if seconds % second == 0 {
                    write!(f, "{}S", seconds / second)?;
                } else {
                    write!(f, "{}S", seconds as f64 / second as f64)?;
                }
            }
        }
        Ok(())
    }
}

fn invalid(kind: &'static str, text: &str) -> EvalError {
    EvalError::InvalidTemporal {
        kind,
        text: text.to_string(),
    }
}

fn capture_i64(captures: &regex::Captures, index: usize) -> Option<i64> {
    captures
        .get(index)
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

pub fn parse_duration(text: &str) -> EvalResult<Duration> {
    let text = text.trim();
    if text.ends_with('P') || text.ends_with('T') {
        return Err(invalid("duration", text));
    }
    if let Some(captures) = YEAR_MONTH_DURATION.captures(text) {
        let years = capture_i64(&captures, 2).unwrap_or(0);
        let months = capture_i64(&captures, 3).unwrap_or(0);
        let total = years
            .checked_mul(12)
            .and_then(|y| y.checked_add(months))
            .ok_or_else(|| invalid("duration", text))?;
        let duration = Duration::from_months(total);
        return match captures.get(1) {
            Some(_) => duration
                .checked_negate()
                .ok_or_else(|| invalid("duration", text)),
            None => Ok(duration),
        };
    }
    if let Some(captures) = DAY_TIME_DURATION.captures(text) {
        let days = capture_i64(&captures, 2).unwrap_or(0);
        let hours = capture_i64(&captures, 3).unwrap_or(0);
        let minutes = capture_i64(&captures, 4).unwrap_or(0);
        let seconds = captures
            .get(5)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0);
        let millis = days
            .checked_mul(MILLIS_PER_DAY)
            .and_then(|d| d.checked_add(hours.checked_mul(MILLIS_PER_HOUR)?))
            .and_then(|d| d.checked_add(minutes.checked_mul(MILLIS_PER_MINUTE)?))
            .and_then(|d| d.checked_add(scale_part(MILLIS_PER_SECOND, seconds)?))
            .ok_or_else(|| invalid("duration", text))?;
        let duration = Duration::from_millis(millis);
        return match captures.get(1) {
            Some(_) => duration
                .checked_negate()
                .ok_or_else(|| invalid("duration", text)),
            None => Ok(duration),
        };
    }
    Err(invalid("duration", text))
}

pub fn parse_date(text: &str) -> EvalResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| invalid("date", text))
}

pub fn parse_time(text: &str) -> EvalResult<NaiveTime> {
    let trimmed = text.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| invalid("time", text))
}

pub fn parse_date_time(text: &str) -> EvalResult<NaiveDateTime> {
    let trimmed = text.trim();
    match trimmed.split_once('T') {
        Some((date, time)) => Ok(parse_date(date)?.and_time(parse_time(time)?)),
        // a plain date is midnight of that day
        None => Ok(parse_date(trimmed)?.and_time(NaiveTime::MIN)),
    }
}

fn time_delta(millis: i64) -> Option<TimeDelta> {
    TimeDelta::try_milliseconds(millis)
}

fn add_months_to_date(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let amount = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(amount)
    } else {
        date.checked_sub_months(amount)
    }
}

/// Days-time parts are applied in whole days.
pub fn add_to_date(date: NaiveDate, duration: &Duration) -> Option<NaiveDate> {
    let date = add_months_to_date(date, duration.months)?;
    date.checked_add_signed(TimeDelta::try_days(duration.millis / MILLIS_PER_DAY)?)
}

pub fn add_to_date_time(value: NaiveDateTime, duration: &Duration) -> Option<NaiveDateTime> {
    let date = add_months_to_date(value.date(), duration.months)?;
    date.and_time(value.time())
        .checked_add_signed(time_delta(duration.millis)?)
}

/// Times wrap around midnight; the calendar part is ignored.
pub fn add_to_time(time: NaiveTime, duration: &Duration) -> Option<NaiveTime> {
    let (time, _) = time.overflowing_add_signed(time_delta(duration.millis % MILLIS_PER_DAY)?);
    Some(time)
}

pub fn between_dates(left: NaiveDate, right: NaiveDate) -> Duration {
    Duration::from_millis((left - right).num_days() * MILLIS_PER_DAY)
}

pub fn between_date_times(left: NaiveDateTime, right: NaiveDateTime) -> Duration {
    Duration::from_millis((left - right).num_milliseconds())
}

pub fn between_times(left: NaiveTime, right: NaiveTime) -> Duration {
    Duration::from_millis((left - right).num_milliseconds())
}

/// Calendar months from `right` to `left`, counting only completed months.
pub fn months_between(left: NaiveDate, right: NaiveDate) -> i64 {
    let mut months = (left.year() as i64 - right.year() as i64) * 12 + left.month() as i64
        - right.month() as i64;
    if months > 0 && left.day() < right.day() {
        months -= 1;
    } else if months < 0 && left.day() > right.day() {
        months += 1;
    }
    months
}
