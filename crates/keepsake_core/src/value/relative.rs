//! Expression-level relative parsing (`+1y 2m`, `-4H`, `+`).
//!
//! # Invariants
//! - Entries without a leading `+`/`-` are not relative (`None`).
//! - A bare sign means "no change" and yields the context.
//! - Tokens apply left to right on a running accumulator.
//! - `relative_temporal` is all-or-nothing: any failure yields the
//!   untouched context, never a partial result.

use crate::value::adjust::{AdjustResult, TemporalAdjust};
use log::debug;

/// Strict relative parse. Errors propagate to the caller.
///
/// Returns `Ok(None)` when `entry` is not a relative expression.
pub fn try_relative_temporal<T, F>(context: &T, entry: &str, adjuster: F) -> AdjustResult<Option<T>>
where
    T: Clone,
    F: Fn(&TemporalAdjust, T) -> AdjustResult<T>,
{
    let multiplier = match entry.chars().next() {
        Some('+') => 1,
        Some('-') => -1,
        _ => return Ok(None),
    };

    let remainder = &entry[1..];
    let mut accumulator = context.clone();
    for token in remainder.split_whitespace() {
        let adjust = TemporalAdjust::parse(token)?.sign(multiplier)?;
        accumulator = adjuster(&adjust, accumulator)?;
    }
    Ok(Some(accumulator))
}

/// Relative parse with silent fallback.
///
/// Returns `None` when `entry` is not relative; otherwise the adjusted value,
/// or `context` unchanged when any token fails to parse or apply.
pub fn relative_temporal<T, F>(context: &T, entry: &str, adjuster: F) -> Option<T>
where
    T: Clone,
    F: Fn(&TemporalAdjust, T) -> AdjustResult<T>,
{
    match try_relative_temporal(context, entry, adjuster) {
        Ok(result) => result,
        Err(err) => {
            debug!(
                "event=relative_parse module=value status=fallback error={}",
                err
            );
            Some(context.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{relative_temporal, try_relative_temporal};
    use crate::value::adjust::{AdjustError, TemporalAdjust};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn adjust_date(
        adjust: &TemporalAdjust,
        value: NaiveDate,
    ) -> Result<NaiveDate, AdjustError> {
        adjust.adjust_local_date(value)
    }

    #[test]
    fn non_relative_entry_is_none() {
        assert_eq!(relative_temporal(&date(2020, 1, 1), "2020-01-05", adjust_date), None);
    }

    #[test]
    fn bare_sign_returns_context() {
        let context = date(2020, 1, 1);
        assert_eq!(relative_temporal(&context, "+", adjust_date), Some(context));
        assert_eq!(relative_temporal(&context, "-", adjust_date), Some(context));
    }

    #[test]
    fn tokens_compose_sequentially() {
        // +1y -> 2021-01-31, then +1m clamps to 2021-02-28.
        let result = relative_temporal(&date(2020, 1, 31), "+1y 1m", adjust_date);
        assert_eq!(result, Some(date(2021, 2, 28)));

        let month_first = relative_temporal(&date(2020, 1, 30), "+1m 1d", adjust_date);
        let day_first = relative_temporal(&date(2020, 1, 30), "+1d 1m", adjust_date);
        assert_eq!(month_first, Some(date(2020, 3, 1)));
        assert_eq!(day_first, Some(date(2020, 2, 29)));

        let back = relative_temporal(&date(2020, 3, 31), "-1m 1d", adjust_date);
        assert_eq!(back, Some(date(2020, 2, 28)));
    }

    #[test]
    fn sign_applies_to_every_token() {
        let result = relative_temporal(&date(2020, 3, 15), "-1w 1d", adjust_date);
        assert_eq!(result, Some(date(2020, 3, 7)));
    }

    #[test]
    fn any_failure_returns_untouched_context() {
        let context = date(2020, 1, 1);
        assert_eq!(
            relative_temporal(&context, "+1d 3.5d", adjust_date),
            Some(context)
        );
        assert_eq!(relative_temporal(&context, "+3x", adjust_date), Some(context));
        assert_eq!(relative_temporal(&context, "+2d 4H", adjust_date), Some(context));
    }

    #[test]
    fn strict_form_reports_the_failure() {
        let err = try_relative_temporal(&date(2020, 1, 1), "+2d 4H", adjust_date).unwrap_err();
        assert!(matches!(err, AdjustError::IncompatibleField { field: "hours", .. }));
    }
}
