//! Supported temporal kinds and their per-kind behavior.
//!
//! # Responsibility
//! - Bind each chrono type to its adjuster, encoding format and defaults.
//! - Provide `OffsetTime`, which chrono does not model.
//!
//! # Invariants
//! - Encoding formats round-trip losslessly (`%.f` keeps sub-second digits).
//! - Formatting never panics; unsupported specifiers yield `None`.

use crate::value::adjust::{AdjustResult, TemporalAdjust};
use crate::value::scalar::ScalarValue;
use crate::value::semantics::FormatSet;
use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::fmt::{Debug, Display, Formatter, Write};
use std::str::FromStr;

/// Time of day with a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OffsetTime {
    pub time: NaiveTime,
    pub offset: FixedOffset,
}

impl OffsetTime {
    pub fn new(time: NaiveTime, offset: FixedOffset) -> Self {
        Self { time, offset }
    }

    fn anchored(&self) -> Option<DateTime<FixedOffset>> {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
        self.offset
            .from_local_datetime(&epoch.and_time(self.time))
            .single()
    }
}

impl Display for OffsetTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.time, self.offset)
    }
}

/// The six temporal kinds with relative-adjustment support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    Date,
    Time,
    OffsetTime,
    DateTime,
    OffsetDateTime,
    ZonedDateTime,
}

impl TemporalKind {
    pub const ALL: [TemporalKind; 6] = [
        Self::Date,
        Self::Time,
        Self::OffsetTime,
        Self::DateTime,
        Self::OffsetDateTime,
        Self::ZonedDateTime,
    ];

    /// User-facing type name used in parse-failure messages.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Time => "Time",
            Self::OffsetTime => "OffsetTime",
            Self::DateTime => "DateTime",
            Self::OffsetDateTime => "OffsetDateTime",
            Self::ZonedDateTime => "ZonedDateTime",
        }
    }

    /// Stable key used in configuration files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::OffsetTime => "offset-time",
            Self::DateTime => "date-time",
            Self::OffsetDateTime => "offset-date-time",
            Self::ZonedDateTime => "zoned-date-time",
        }
    }

    /// Lossless storage format; always the first absolute parser.
    pub fn encoding_format(self) -> &'static str {
        match self {
            Self::Date => "%Y%m%d",
            Self::Time => "%H%M%S%.f",
            Self::OffsetTime => "%H%M%S%.f%z",
            Self::DateTime => "%Y%m%dT%H%M%S%.f",
            Self::OffsetDateTime | Self::ZonedDateTime => "%Y%m%dT%H%M%S%.f%z",
        }
    }

    pub fn default_formats(self) -> FormatSet {
        let (display, parse): (&str, &[&str]) = match self {
            Self::Date => (
                "%Y-%m-%d",
                &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%d %b %Y", "%d-%b-%Y"],
            ),
            Self::Time => ("%H:%M:%S", &["%H:%M:%S", "%H:%M", "%I:%M %p"]),
            Self::OffsetTime => ("%H:%M:%S%:z", &["%H:%M:%S%:z", "%H:%M%:z"]),
            Self::DateTime => (
                "%Y-%m-%d %H:%M:%S",
                &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"],
            ),
            Self::OffsetDateTime => (
                "%Y-%m-%d %H:%M:%S %:z",
                &[
                    "%Y-%m-%dT%H:%M:%S%.f%:z",
                    "%Y-%m-%d %H:%M:%S %:z",
                    "%Y-%m-%d %H:%M %:z",
                ],
            ),
            Self::ZonedDateTime => (
                "%Y-%m-%d %H:%M:%S %Z",
                &[
                    "%Y-%m-%dT%H:%M:%S%.f%:z",
                    "%Y-%m-%dT%H:%M:%S%.fZ",
                    "%Y-%m-%d %H:%M:%S",
                ],
            ),
        };
        FormatSet {
            display: display.to_string(),
            parse: parse.iter().map(|format| format.to_string()).collect(),
        }
    }
}

impl Display for TemporalKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemporalKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "unsupported temporal kind `{value}`; expected one of {}",
                    Self::ALL.map(TemporalKind::as_str).join("|")
                )
            })
    }
}

/// A chrono value that supports parsing, presentation and relative adjustment.
pub trait TemporalValue: Clone + PartialEq + Debug + Sized {
    const KIND: TemporalKind;

    /// Kind-specific adjuster handed to the relative parser.
    fn adjust(adjust: &TemporalAdjust, value: Self) -> AdjustResult<Self>;

    /// Parses `text` with one strftime pattern, requiring full consumption.
    fn parse_with_format(text: &str, format: &str) -> Option<Self>;

    fn format_with(&self, format: &str) -> Option<String>;

    fn into_scalar(self) -> ScalarValue;

    fn from_scalar(value: &ScalarValue) -> Option<Self>;
}

fn render(value: impl Display) -> Option<String> {
    let mut out = String::new();
    write!(out, "{value}").ok()?;
    Some(out)
}

impl TemporalValue for NaiveDate {
    const KIND: TemporalKind = TemporalKind::Date;

    fn adjust(adjust: &TemporalAdjust, value: Self) -> AdjustResult<Self> {
        adjust.adjust_local_date(value)
    }

    fn parse_with_format(text: &str, format: &str) -> Option<Self> {
        NaiveDate::parse_from_str(text, format).ok()
    }

    fn format_with(&self, format: &str) -> Option<String> {
        render(self.format(format))
    }

    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Date(self)
    }

    fn from_scalar(value: &ScalarValue) -> Option<Self> {
        match value {
            ScalarValue::Date(date) => Some(*date),
            _ => None,
        }
    }
}

impl TemporalValue for NaiveTime {
    const KIND: TemporalKind = TemporalKind::Time;

    fn adjust(adjust: &TemporalAdjust, value: Self) -> AdjustResult<Self> {
        adjust.adjust_local_time(value)
    }

    fn parse_with_format(text: &str, format: &str) -> Option<Self> {
        NaiveTime::parse_from_str(text, format).ok()
    }

    fn format_with(&self, format: &str) -> Option<String> {
        render(self.format(format))
    }

    fn into_scalar(self) -> ScalarValue {
        ScalarValue::Time(self)
    }

    fn from_scalar(value: &ScalarValue) -> Option<Self> {
        match value {
            ScalarValue::Time(time) => Some(*time),
            _ => None,
        }
    }
}

impl TemporalValue for OffsetTime {
    const KIND: TemporalKind = TemporalKind::OffsetTime;

    fn adjust(adjust: &TemporalAdjust, value: Self) -> AdjustResult<Self> {
        adjust.adjust_offset_time(value)
    }

    fn parse_with_format(text: &str, format: &str) -> Option<Self> {
        let mut parsed = Parsed::new();
        parse(&mut parsed, text, StrftimeItems::new(format)).ok()?;
        let time = parsed.to_naive_time().ok()?;
        let offset = parsed.to_fixed_offset().ok()?;
        Some(OffsetTime::new(time, offset))
    }

    fn format_with(&self, format: &str) -> Option<String> {
        render(self.anchored()?.format(format))
    }

    fn into_scalar(self) -> ScalarValue {
        ScalarValue::OffsetTime(self)
    }

    fn from_scalar(value: &ScalarValue) -> Option<Self> {
        match value {
            ScalarValue::OffsetTime(time) => Some(*time),
            _ => None,
        }
    }
}

impl TemporalValue for NaiveDateTime {
    const KIND: TemporalKind = TemporalKind::DateTime;

    fn adjust(adjust: &TemporalAdjust, value: Self) -> AdjustResult<Self> {
        adjust.adjust_local_date_time(value)
    }

    fn parse_with_format(text: &str, format: &str) -> Option<Self> {
        NaiveDateTime::parse_from_str(text, format).ok()
    }

    fn format_with(&self, format: &str) -> Option<String> {
        render(self.format(format))
    }

    fn into_scalar(self) -> ScalarValue {
        ScalarValue::DateTime(self)
    }

    fn from_scalar(value: &ScalarValue) -> Option<Self> {
        match value {
            ScalarValue::DateTime(value) => Some(*value),
            _ => None,
        }
    }
}

impl TemporalValue for DateTime<FixedOffset> {
    const KIND: TemporalKind = TemporalKind::OffsetDateTime;

    fn adjust(adjust: &TemporalAdjust, value: Self) -> AdjustResult<Self> {
        adjust.adjust_offset_date_time(value)
    }

    fn parse_with_format(text: &str, format: &str) -> Option<Self> {
        DateTime::parse_from_str(text, format).ok()
    }

    fn format_with(&self, format: &str) -> Option<String> {
        render(self.format(format))
    }

    fn into_scalar(self) -> ScalarValue {
        ScalarValue::OffsetDateTime(self)
    }

    fn from_scalar(value: &ScalarValue) -> Option<Self> {
        match value {
            ScalarValue::OffsetDateTime(value) => Some(*value),
            _ => None,
        }
    }
}

/// Zoned values are normalised to UTC; the original zone is not retained.
impl TemporalValue for DateTime<Utc> {
    const KIND: TemporalKind = TemporalKind::ZonedDateTime;

    fn adjust(adjust: &TemporalAdjust, value: Self) -> AdjustResult<Self> {
        adjust.adjust_zoned_date_time(value)
    }

    fn parse_with_format(text: &str, format: &str) -> Option<Self> {
        match DateTime::parse_from_str(text, format) {
            Ok(value) => Some(value.with_timezone(&Utc)),
            // Patterns without an offset read as UTC wall-clock time.
            Err(_) => NaiveDateTime::parse_from_str(text, format)
                .ok()
                .map(|value| value.and_utc()),
        }
    }

    fn format_with(&self, format: &str) -> Option<String> {
        render(self.format(format))
    }

    fn into_scalar(self) -> ScalarValue {
        ScalarValue::ZonedDateTime(self)
    }

    fn from_scalar(value: &ScalarValue) -> Option<Self> {
        match value {
            ScalarValue::ZonedDateTime(value) => Some(*value),
            _ => None,
        }
    }
}
