// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Conversion of `create_time` values into the date a question was asked.
//!
//! Exports store `create_time` as epoch seconds (often fractional), and
//! some tools rewrite it as an ISO-8601 string. Anything that cannot be
//! read falls back to the current date. The result says which path was
//! taken so the caller can warn about it.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use std::fmt;

/// Why a date had to be substituted with the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultReason {
    /// The conversation had no `create_time` (or it was null).
    Missing,
    /// The string could not be parsed as an ISO-8601 timestamp.
    Unparseable,
    /// The number was outside the representable range.
    OutOfRange,
    /// The value was neither a number nor a string.
    UnsupportedType,
}

impl fmt::Display for DefaultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Missing => "no create_time",
            Self::Unparseable => "unparseable create_time",
            Self::OutOfRange => "create_time out of range",
            Self::UnsupportedType => "create_time is neither a number nor a string",
        })
    }
}

/// How an [`AskedDate`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrigin {
    /// Read from the conversation's `create_time`.
    Parsed,
    /// Substituted with the conversion date.
    Defaulted(DefaultReason),
}

/// The calendar date a conversation was started, in the display zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AskedDate {
    /// The date in the display zone.
    pub date: NaiveDate,
    /// Whether the date came from the data or was substituted.
    pub origin: DateOrigin,
}

impl AskedDate {
    /// Returns `true` if the date was substituted rather than parsed.
    #[must_use]
    pub const fn is_defaulted(&self) -> bool {
        matches!(self.origin, DateOrigin::Defaulted(_))
    }
}

impl fmt::Display for AskedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%Y-%m-%d"))
    }
}

/// Normalizes a raw `create_time` into a date in the local time zone.
#[must_use]
pub fn normalize(raw: Option<&Value>) -> AskedDate {
    normalize_in(raw, &Local)
}

/// Normalizes a raw `create_time` into a date in the given time zone.
///
/// Numbers are seconds since the Unix epoch. Strings are parsed as RFC 3339
/// (a trailing `Z` means UTC); strings without an offset are taken as wall
/// time in `tz`. Everything else yields today's date in `tz`.
///
/// # Example
///
/// ```
/// use chatgpt2md::timestamp::{DateOrigin, normalize_in};
/// use chrono::Utc;
/// use serde_json::json;
///
/// let date = normalize_in(Some(&json!(1_700_000_000)), &Utc);
/// assert_eq!(date.to_string(), "2023-11-14");
/// assert_eq!(date.origin, DateOrigin::Parsed);
/// ```
#[must_use]
pub fn normalize_in<Tz: TimeZone>(raw: Option<&Value>, tz: &Tz) -> AskedDate {
    match parse_instant(raw, tz) {
        Ok(instant) => AskedDate {
            date: instant.with_timezone(tz).date_naive(),
            origin: DateOrigin::Parsed,
        },
        Err(reason) => AskedDate {
            date: Utc::now().with_timezone(tz).date_naive(),
            origin: DateOrigin::Defaulted(reason),
        },
    }
}

fn parse_instant<Tz: TimeZone>(
    raw: Option<&Value>,
    tz: &Tz,
) -> Result<DateTime<Utc>, DefaultReason> {
    match raw {
        None | Some(Value::Null) => Err(DefaultReason::Missing),
        Some(Value::Number(n)) => n
            .as_i64()
            .map_or_else(
                || n.as_f64().and_then(from_epoch_secs_f64),
                |secs| DateTime::from_timestamp(secs, 0),
            )
            .ok_or(DefaultReason::OutOfRange),
        Some(Value::String(s)) => parse_iso8601(s.trim(), tz).ok_or(DefaultReason::Unparseable),
        Some(_) => Err(DefaultReason::UnsupportedType),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn from_epoch_secs_f64(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

fn parse_iso8601<Tz: TimeZone>(s: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
