//! Relative temporal adjustments (`+3d`, `-2w`, `+1y 2m 4H`).
//!
//! # Responsibility
//! - Parse one adjustment token into a single-field `TemporalAdjust`.
//! - Apply an adjustment to each supported temporal kind.
//!
//! # Invariants
//! - A parsed token sets exactly one field (`w` lands in `days`).
//! - Date-only values reject clock fields; time-only values reject calendar
//!   fields. Rejection happens at apply time, never at parse time.
//! - Date-time kinds apply fields in the order years, months, days, hours,
//!   minutes. Month arithmetic clamps the day-of-month.

use crate::value::temporal::OffsetTime;
use chrono::{
    DateTime, Days, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AdjustResult<T> = Result<T, AdjustError>;

/// Failures raised while parsing or applying an adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdjustError {
    /// Numeric part of a token is not an `i32`.
    InvalidNumber(String),
    /// `sign` was called with something other than `+1` or `-1`.
    UnsupportedMultiplier(i32),
    /// A field that the target kind cannot carry is non-zero.
    IncompatibleField {
        kind: &'static str,
        field: &'static str,
    },
    /// Result falls outside the representable range.
    Overflow { kind: &'static str },
}

impl Display for AdjustError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber(token) => write!(f, "adjustment is not an integer: `{token}`"),
            Self::UnsupportedMultiplier(value) => {
                write!(f, "adjustment sign must be +1 or -1, got {value}")
            }
            Self::IncompatibleField { kind, field } => {
                write!(f, "cannot adjust {field} of a {kind}")
            }
            Self::Overflow { kind } => write!(f, "{kind} adjustment is out of range"),
        }
    }
}

impl Error for AdjustError {}

/// One relative adjustment across the five supported fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TemporalAdjust {
    pub years: i32,
    pub months: i32,
    pub days: i32,
    pub hours: i32,
    pub minutes: i32,
}

impl TemporalAdjust {
    /// Parses a single unsigned token such as `3d`, `2w` or `15M`.
    ///
    /// Suffixes are matched case-sensitively in the order `H`, `M`, `w`, `y`,
    /// `m`, `d`. Without a recognised suffix the whole token is a day count.
    pub fn parse(token: &str) -> AdjustResult<Self> {
        let mut adjust = Self::default();
        if let Some(number) = token.strip_suffix('H') {
            adjust.hours = parse_number(number)?;
        } else if let Some(number) = token.strip_suffix('M') {
            adjust.minutes = parse_number(number)?;
        } else if let Some(number) = token.strip_suffix('w') {
            adjust.days = parse_number(number)?
                .checked_mul(7)
                .ok_or(AdjustError::Overflow { kind: "week count" })?;
        } else if let Some(number) = token.strip_suffix('y') {
            adjust.years = parse_number(number)?;
        } else if let Some(number) = token.strip_suffix('m') {
            adjust.months = parse_number(number)?;
        } else if let Some(number) = token.strip_suffix('d') {
            adjust.days = parse_number(number)?;
        } else {
            adjust.days = parse_number(token)?;
        }
        Ok(adjust)
    }

    /// Applies the expression sign to every field.
    ///
    /// # Errors
    /// - `UnsupportedMultiplier` for anything other than `+1` or `-1`.
    pub fn sign(self, multiplier: i32) -> AdjustResult<Self> {
        match multiplier {
            1 => Ok(self),
            -1 => Ok(Self {
                years: negate(self.years)?,
                months: negate(self.months)?,
                days: negate(self.days)?,
                hours: negate(self.hours)?,
                minutes: negate(self.minutes)?,
            }),
            other => Err(AdjustError::UnsupportedMultiplier(other)),
        }
    }

    fn has_calendar_fields(&self) -> bool {
        self.years != 0 || self.months != 0 || self.days != 0
    }

    pub fn adjust_local_date(&self, date: NaiveDate) -> AdjustResult<NaiveDate> {
        const KIND: &str = "date";
        if self.hours != 0 {
            return Err(AdjustError::IncompatibleField {
                kind: KIND,
                field: "hours",
            });
        }
        if self.minutes != 0 {
            return Err(AdjustError::IncompatibleField {
                kind: KIND,
                field: "minutes",
            });
        }
        self.apply_calendar(date, KIND)
    }

    pub fn adjust_local_time(&self, time: NaiveTime) -> AdjustResult<NaiveTime> {
        self.reject_calendar_fields("time")?;
        Ok(self.apply_clock(time))
    }

    pub fn adjust_offset_time(&self, value: OffsetTime) -> AdjustResult<OffsetTime> {
        self.reject_calendar_fields("offset time")?;
        Ok(OffsetTime::new(self.apply_clock(value.time), value.offset))
    }

    pub fn adjust_local_date_time(&self, value: NaiveDateTime) -> AdjustResult<NaiveDateTime> {
        self.apply_all(value, "date-time")
    }

    pub fn adjust_offset_date_time(
        &self,
        value: DateTime<FixedOffset>,
    ) -> AdjustResult<DateTime<FixedOffset>> {
        self.apply_all(value, "offset date-time")
    }

    /// Adjusts a zoned value. Calendar fields move the local date, clock
    /// fields move the instant.
    pub fn adjust_zoned_date_time<Tz: TimeZone>(
        &self,
        value: DateTime<Tz>,
    ) -> AdjustResult<DateTime<Tz>> {
        self.apply_all(value, "zoned date-time")
    }

    fn reject_calendar_fields(&self, kind: &'static str) -> AdjustResult<()> {
        if !self.has_calendar_fields() {
            return Ok(());
        }
        let field = if self.years != 0 {
            "years"
        } else if self.months != 0 {
            "months"
        } else {
            "days"
        };
        Err(AdjustError::IncompatibleField { kind, field })
    }

    fn apply_calendar<T: CalendarArithmetic>(
        &self,
        value: T,
        kind: &'static str,
    ) -> AdjustResult<T> {
        let overflow = AdjustError::Overflow { kind };
        let mut value = value;
        if self.years != 0 {
            let months = i64::from(self.years) * 12;
            value = value.plus_months(months).ok_or(overflow.clone())?;
        }
        if self.months != 0 {
            value = value
                .plus_months(i64::from(self.months))
                .ok_or(overflow.clone())?;
        }
        if self.days != 0 {
            value = value.plus_days(i64::from(self.days)).ok_or(overflow)?;
        }
        Ok(value)
    }

    fn apply_all<T: CalendarArithmetic>(&self, value: T, kind: &'static str) -> AdjustResult<T> {
        let mut value = self.apply_calendar(value, kind)?;
        if self.hours != 0 {
            value = value
                .plus_duration(Duration::hours(i64::from(self.hours)))
                .ok_or(AdjustError::Overflow { kind })?;
        }
        if self.minutes != 0 {
            value = value
                .plus_duration(Duration::minutes(i64::from(self.minutes)))
                .ok_or(AdjustError::Overflow { kind })?;
        }
        Ok(value)
    }

    fn apply_clock(&self, time: NaiveTime) -> NaiveTime {
        let (time, _) = time.overflowing_add_signed(Duration::hours(i64::from(self.hours)));
        let (time, _) = time.overflowing_add_signed(Duration::minutes(i64::from(self.minutes)));
        time
    }
}

fn parse_number(text: &str) -> AdjustResult<i32> {
    text.parse::<i32>()
        .map_err(|_| AdjustError::InvalidNumber(text.to_string()))
}

fn negate(value: i32) -> AdjustResult<i32> {
    value
        .checked_neg()
        .ok_or(AdjustError::Overflow { kind: "adjustment" })
}

/// Calendar and clock steps shared by the dated kinds.
trait CalendarArithmetic: Sized {
    fn plus_months(self, months: i64) -> Option<Self>;
    fn plus_days(self, days: i64) -> Option<Self>;
    fn plus_duration(self, duration: Duration) -> Option<Self>;
}

fn months_of(count: i64) -> Option<Months> {
    u32::try_from(count.unsigned_abs()).ok().map(Months::new)
}

impl CalendarArithmetic for NaiveDate {
    fn plus_months(self, months: i64) -> Option<Self> {
        let step = months_of(months)?;
        if months >= 0 {
            self.checked_add_months(step)
        } else {
            self.checked_sub_months(step)
        }
    }

    fn plus_days(self, days: i64) -> Option<Self> {
        let step = Days::new(days.unsigned_abs());
        if days >= 0 {
            self.checked_add_days(step)
        } else {
            self.checked_sub_days(step)
        }
    }

    fn plus_duration(self, duration: Duration) -> Option<Self> {
        self.checked_add_signed(duration)
    }
}

impl CalendarArithmetic for NaiveDateTime {
    fn plus_months(self, months: i64) -> Option<Self> {
        let step = months_of(months)?;
        if months >= 0 {
            self.checked_add_months(step)
        } else {
            self.checked_sub_months(step)
        }
    }

    fn plus_days(self, days: i64) -> Option<Self> {
        let step = Days::new(days.unsigned_abs());
        if days >= 0 {
            self.checked_add_days(step)
        } else {
            self.checked_sub_days(step)
        }
    }

    fn plus_duration(self, duration: Duration) -> Option<Self> {
        self.checked_add_signed(duration)
    }
}

impl<Tz: TimeZone> CalendarArithmetic for DateTime<Tz> {
    fn plus_months(self, months: i64) -> Option<Self> {
        let step = months_of(months)?;
        if months >= 0 {
            self.checked_add_months(step)
        } else {
            self.checked_sub_months(step)
        }
    }

    fn plus_days(self, days: i64) -> Option<Self> {
        let step = Days::new(days.unsigned_abs());
        if days >= 0 {
            self.checked_add_days(step)
        } else {
            self.checked_sub_days(step)
        }
    }

    fn plus_duration(self, duration: Duration) -> Option<Self> {
        self.checked_add_signed(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::{AdjustError, TemporalAdjust};
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parse_uses_case_sensitive_suffix_table() {
        assert_eq!(TemporalAdjust::parse("4H").unwrap().hours, 4);
        assert_eq!(TemporalAdjust::parse("15M").unwrap().minutes, 15);
        assert_eq!(TemporalAdjust::parse("2w").unwrap().days, 14);
        assert_eq!(TemporalAdjust::parse("1y").unwrap().years, 1);
        assert_eq!(TemporalAdjust::parse("3m").unwrap().months, 3);
        assert_eq!(TemporalAdjust::parse("5d").unwrap().days, 5);
        assert_eq!(TemporalAdjust::parse("9").unwrap().days, 9);
    }

    #[test]
    fn parse_sets_exactly_one_field() {
        let adjust = TemporalAdjust::parse("7m").unwrap();
        assert_eq!(
            adjust,
            TemporalAdjust {
                months: 7,
                ..TemporalAdjust::default()
            }
        );
    }

    #[test]
    fn parse_rejects_unknown_suffix_and_fractions() {
        assert_eq!(
            TemporalAdjust::parse("3x").unwrap_err(),
            AdjustError::InvalidNumber("3x".to_string())
        );
        assert_eq!(
            TemporalAdjust::parse("3.5d").unwrap_err(),
            AdjustError::InvalidNumber("3.5".to_string())
        );
        assert!(TemporalAdjust::parse("3h").is_err());
    }

    #[test]
    fn sign_negates_or_rejects() {
        let adjust = TemporalAdjust::parse("3d").unwrap();
        assert_eq!(adjust.sign(1).unwrap(), adjust);
        assert_eq!(adjust.sign(-1).unwrap().days, -3);
        assert_eq!(
            adjust.sign(2).unwrap_err(),
            AdjustError::UnsupportedMultiplier(2)
        );
    }

    #[test]
    fn local_date_rejects_clock_fields() {
        let adjust = TemporalAdjust::parse("4H").unwrap();
        let err = adjust.adjust_local_date(date(2020, 1, 1)).unwrap_err();
        assert_eq!(
            err,
            AdjustError::IncompatibleField {
                kind: "date",
                field: "hours"
            }
        );
    }

    #[test]
    fn local_time_rejects_calendar_fields_and_wraps_midnight() {
        let years = TemporalAdjust::parse("1y").unwrap();
        let time = NaiveTime::from_hms_opt(23, 30, 0).unwrap();
        assert!(matches!(
            years.adjust_local_time(time),
            Err(AdjustError::IncompatibleField { field: "years", .. })
        ));

        let hour = TemporalAdjust::parse("1H").unwrap();
        assert_eq!(
            hour.adjust_local_time(time).unwrap(),
            NaiveTime::from_hms_opt(0, 30, 0).unwrap()
        );
    }

    #[test]
    fn month_arithmetic_clamps_day_of_month() {
        let month = TemporalAdjust::parse("1m").unwrap();
        assert_eq!(
            month.adjust_local_date(date(2020, 1, 31)).unwrap(),
            date(2020, 2, 29)
        );
        let back = month.sign(-1).unwrap();
        assert_eq!(
            back.adjust_local_date(date(2021, 3, 31)).unwrap(),
            date(2021, 2, 28)
        );
    }

    #[test]
    fn date_time_applies_fields_in_fixed_order() {
        let adjust = TemporalAdjust {
            months: 1,
            days: 1,
            ..TemporalAdjust::default()
        };
        let start = date(2021, 1, 31).and_hms_opt(10, 0, 0).unwrap();
        // months first: 2021-02-28, then +1 day -> 2021-03-01.
        let expected: NaiveDateTime = date(2021, 3, 1).and_hms_opt(10, 0, 0).unwrap();
        assert_eq!(adjust.adjust_local_date_time(start).unwrap(), expected);
    }

    #[test]
    fn overflow_is_reported() {
        let adjust = TemporalAdjust {
            years: 1_000_000,
            ..TemporalAdjust::default()
        };
        assert!(matches!(
            adjust.adjust_local_date(date(2020, 1, 1)),
            Err(AdjustError::Overflow { kind: "date" })
        ));
    }
}
