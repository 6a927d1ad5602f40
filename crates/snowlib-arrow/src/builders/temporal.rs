//! Temporal type builders for date and time Arrow arrays.
//!
//! Implements builders for:
//! - Date32 (DATE)
//! - Time64(Nanosecond) (TIME)
//! - Timestamp(Nanosecond, tz) (TIMESTAMP_NTZ / LTZ / TZ)
//!
//! # Wire Formats
//!
//! The SQL API renders temporal values as numbers:
//!
//! | Type | Cell | Meaning |
//! |------|------|---------|
//! | DATE | `"19889"` | days since 1970-01-01 |
//! | TIME | `"45045.123000000"` | seconds since midnight |
//! | TIMESTAMP_NTZ/LTZ | `"1718409600.000000000"` | seconds since epoch |
//! | TIMESTAMP_TZ | `"1718409600.000000000 1560"` | epoch seconds, then offset minutes + 1440 |
//!
//! ISO strings (`YYYY-MM-DD`, `HH:MM:SS`, `YYYY-MM-DD HH:MM:SS.f`) are also
//! accepted so results produced with custom output formats still convert.

use std::sync::Arc;

use arrow_array::ArrayRef;
use arrow_array::builder::{Date32Builder, Time64NanosecondBuilder, TimestampNanosecondBuilder};

use crate::traits::builder::SnowflakeCompatibleBuilder;
use crate::traits::sealed::private::Sealed;
use crate::{ArrowConversionError, Result};

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const SECONDS_PER_DAY: i64 = 86_400;

// ═══════════════════════════════════════════════════════════════════════════
// Date32 Builder (Days since Unix epoch)
// ═══════════════════════════════════════════════════════════════════════════

/// Builder for Arrow Date32 arrays.
#[derive(Debug)]
pub struct Date32BuilderWrapper {
    builder: Date32Builder,
    len: usize,
}

impl Date32BuilderWrapper {
    /// Create a new date builder.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            builder: Date32Builder::with_capacity(capacity),
            len: 0,
        }
    }

    /// Parse a DATE cell into days since Unix epoch.
    fn parse_date(cell: &str) -> Result<i32> {
        let text = cell.trim();
        if text.contains('-') && !text.starts_with('-') {
            return parse_date_string(text);
        }
        text.parse().map_err(|_| {
            ArrowConversionError::value_conversion("date", format!("invalid date: {cell}"))
        })
    }
}

impl Sealed for Date32BuilderWrapper {}

impl SnowflakeCompatibleBuilder for Date32BuilderWrapper {
    fn append_cell(&mut self, cell: &str) -> Result<()> {
        let days = Self::parse_date(cell)?;
        self.builder.append_value(days);
        self.len += 1;
        Ok(())
    }

    fn append_null(&mut self) {
        self.builder.append_null();
        self.len += 1;
    }

    fn finish(&mut self) -> ArrayRef {
        self.len = 0;
        Arc::new(self.builder.finish())
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.builder.capacity())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Time64 Builder (Nanoseconds since midnight)
// ═══════════════════════════════════════════════════════════════════════════

/// Builder for Arrow Time64(Nanosecond) arrays.
#[derive(Debug)]
pub struct Time64NanosecondBuilderWrapper {
    builder: Time64NanosecondBuilder,
    len: usize,
}

impl Time64NanosecondBuilderWrapper {
    /// Create a new time builder.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            builder: Time64NanosecondBuilder::with_capacity(capacity),
            len: 0,
        }
    }

    /// Parse a TIME cell into nanoseconds since midnight.
    fn parse_time(cell: &str) -> Result<i64> {
        let text = cell.trim();
        let nanos = if text.contains(':') {
            parse_time_string(text)?
        } else {
            parse_scaled_seconds(text, "time")?
        };
        if !(0..SECONDS_PER_DAY * NANOS_PER_SECOND).contains(&nanos) {
            return Err(ArrowConversionError::value_conversion(
                "time",
                format!("time of day out of range: {cell}"),
            ));
        }
        Ok(nanos)
    }
}

impl Sealed for Time64NanosecondBuilderWrapper {}

impl SnowflakeCompatibleBuilder for Time64NanosecondBuilderWrapper {
    fn append_cell(&mut self, cell: &str) -> Result<()> {
        let nanos = Self::parse_time(cell)?;
        self.builder.append_value(nanos);
        self.len += 1;
        Ok(())
    }

    fn append_null(&mut self) {
        self.builder.append_null();
        self.len += 1;
    }

    fn finish(&mut self) -> ArrayRef {
        self.len = 0;
        Arc::new(self.builder.finish())
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.builder.capacity())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Timestamp Builder (Nanoseconds since Unix epoch)
// ═══════════════════════════════════════════════════════════════════════════

/// Builder for Arrow Timestamp(Nanosecond) arrays.
///
/// The timezone, when present, only labels the array: TIMESTAMP_LTZ and
/// TIMESTAMP_TZ cells already carry UTC epoch seconds.
#[derive(Debug)]
pub struct TimestampNanosecondBuilderWrapper {
    builder: TimestampNanosecondBuilder,
    len: usize,
}

impl TimestampNanosecondBuilderWrapper {
    /// Create a new timestamp builder without timezone (TIMESTAMP_NTZ).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_timezone(capacity, None)
    }

    /// Create a new timestamp builder with an optional timezone label.
    #[must_use]
    pub fn with_timezone(capacity: usize, timezone: Option<Arc<str>>) -> Self {
        Self {
            builder: TimestampNanosecondBuilder::with_capacity(capacity).with_timezone_opt(timezone),
            len: 0,
        }
    }

    /// Parse a TIMESTAMP cell into nanoseconds since epoch.
    ///
    /// A trailing TIMESTAMP_TZ offset token is validated and dropped.
    fn parse_timestamp(cell: &str) -> Result<i64> {
        let text = cell.trim();
        if text.contains(':') {
            return parse_datetime_string(text);
        }

        let mut tokens = text.split_whitespace();
        let epoch = tokens.next().unwrap_or_default();
        if let Some(offset) = tokens.next() {
            let encoded: i32 = offset.parse().map_err(|_| {
                ArrowConversionError::value_conversion(
                    "timestamp",
                    format!("invalid timezone offset in: {cell}"),
                )
            })?;
            if !(0..=2880).contains(&encoded) {
                return Err(ArrowConversionError::value_conversion(
                    "timestamp",
                    format!("timezone offset out of range in: {cell}"),
                ));
            }
        }
        if tokens.next().is_some() {
            return Err(ArrowConversionError::value_conversion(
                "timestamp",
                format!("invalid timestamp format: {cell}"),
            ));
        }
        parse_scaled_seconds(epoch, "timestamp")
    }
}

impl Sealed for TimestampNanosecondBuilderWrapper {}

impl SnowflakeCompatibleBuilder for TimestampNanosecondBuilderWrapper {
    fn append_cell(&mut self, cell: &str) -> Result<()> {
        let nanos = Self::parse_timestamp(cell)?;
        self.builder.append_value(nanos);
        self.len += 1;
        Ok(())
    }

    fn append_null(&mut self) {
        self.builder.append_null();
        self.len += 1;
    }

    fn finish(&mut self) -> ArrayRef {
        self.len = 0;
        Arc::new(self.builder.finish())
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.builder.capacity())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Helper Functions
// ═══════════════════════════════════════════════════════════════════════════

/// Parse `[-]seconds[.fraction]` into nanoseconds.
///
/// Fractions longer than nine digits are truncated.
fn parse_scaled_seconds(text: &str, column: &str) -> Result<i64> {
    let invalid = || ArrowConversionError::value_conversion(column, format!("invalid value: {text}"));

    let (negative, digits) = text.strip_prefix('-').map_or((false, text), |rest| (true, rest));
    let (secs, frac) = digits.split_once('.').unwrap_or((digits, ""));
    if secs.is_empty()
        || !secs.bytes().all(|b| b.is_ascii_digit())
        || !frac.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let secs: i64 = secs.parse().map_err(|_| invalid())?;
    let frac_nanos: i64 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<9}");
        padded[..9].parse().map_err(|_| invalid())?
    };

    let total = secs
        .checked_mul(NANOS_PER_SECOND)
        .and_then(|n| n.checked_add(frac_nanos))
        .ok_or_else(invalid)?;
    Ok(if negative { -total } else { total })
}

/// Parse `YYYY-MM-DD` into days since Unix epoch.
fn parse_date_string(s: &str) -> Result<i32> {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != 3 {
        return Err(ArrowConversionError::value_conversion(
            "date",
            format!("invalid date format: {s}"),
        ));
    }

    let year: i32 = parts[0].parse().map_err(|_| {
        ArrowConversionError::value_conversion("date", format!("invalid year in: {s}"))
    })?;
    let month: u32 = parts[1].parse().map_err(|_| {
        ArrowConversionError::value_conversion("date", format!("invalid month in: {s}"))
    })?;
    let day: u32 = parts[2].parse().map_err(|_| {
        ArrowConversionError::value_conversion("date", format!("invalid day in: {s}"))
    })?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(ArrowConversionError::value_conversion(
            "date",
            format!("date out of range: {s}"),
        ));
    }

    Ok(days_from_ymd(year, month, day))
}

/// Parse `HH:MM:SS[.fraction]` into nanoseconds since midnight.
fn parse_time_string(s: &str) -> Result<i64> {
    let (clock, frac) = s.split_once('.').unwrap_or((s, ""));
    let parts: Vec<&str> = clock.split(':').collect();
    if parts.len() != 3 {
        return Err(ArrowConversionError::value_conversion(
            "time",
            format!("invalid time format: {s}"),
        ));
    }

    let mut seconds = 0_i64;
    for (part, limit) in parts.iter().zip([24_i64, 60, 60]) {
        let value: i64 = part.parse().map_err(|_| {
            ArrowConversionError::value_conversion("time", format!("invalid time in: {s}"))
        })?;
        if !(0..limit).contains(&value) {
            return Err(ArrowConversionError::value_conversion(
                "time",
                format!("time out of range: {s}"),
            ));
        }
        seconds = seconds * 60 + value;
    }

    let whole = if frac.is_empty() {
        seconds.to_string()
    } else {
        format!("{seconds}.{frac}")
    };
    parse_scaled_seconds(&whole, "time")
}

/// Parse `YYYY-MM-DD[T| ]HH:MM:SS[.fraction]` into nanoseconds since epoch.
fn parse_datetime_string(s: &str) -> Result<i64> {
    let Some((date, time)) = s.split_once(['T', ' ']) else {
        return Err(ArrowConversionError::value_conversion(
            "timestamp",
            format!("invalid datetime format: {s}"),
        ));
    };
    let days = parse_date_string(date)?;
    let time_nanos = parse_time_string(time.trim())?;
    Ok(i64::from(days) * SECONDS_PER_DAY * NANOS_PER_SECOND + time_nanos)
}

/// Calculate days since Unix epoch (1970-01-01) from year, month, day.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub(crate) const fn days_from_ymd(year: i32, month: u32, day: u32) -> i32 {
    // Algorithm from https://howardhinnant.github.io/date_algorithms.html
    let y = if month <= 2 { year - 1 } else { year };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u32;
    let doy = (153 * (if month > 2 { month - 3 } else { month + 9 }) + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe as i32 - 719_468
}
