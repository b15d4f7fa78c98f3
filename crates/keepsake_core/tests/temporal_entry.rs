use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use keepsake_core::value::relative::{relative_temporal, try_relative_temporal};
use keepsake_core::{AdjustError, TemporalAdjust, TemporalSemantics, TemporalValue, ValueError};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn year_then_month_tokens_compose_in_order() {
    let start = date(2020, 1, 31);

    let one_month = relative_temporal(&start, "+1m", NaiveDate::adjust).unwrap();
    assert_eq!(one_month, date(2020, 2, 29));

    let year_then_months = relative_temporal(&start, "+1y 2m", NaiveDate::adjust).unwrap();
    assert_eq!(year_then_months, date(2021, 3, 31));

    let back = relative_temporal(&date(2021, 3, 31), "-1m", NaiveDate::adjust).unwrap();
    assert_eq!(back, date(2021, 2, 28));
}

#[test]
fn incompatible_fields_are_rejected() {
    let hours = TemporalAdjust::parse("2H").unwrap();
    assert!(matches!(
        hours.adjust_local_date(date(2020, 1, 1)),
        Err(AdjustError::IncompatibleField { field: "hours", .. })
    ));

    let years = TemporalAdjust::parse("1y").unwrap();
    assert!(matches!(
        years.adjust_local_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap()),
        Err(AdjustError::IncompatibleField { field: "years", .. })
    ));
}

#[test]
fn malformed_expression_falls_back_to_context_without_partial_effects() {
    let context = date(2020, 5, 10);

    assert_eq!(
        relative_temporal(&context, "+1d 3.5d", NaiveDate::adjust),
        Some(context)
    );
    assert_eq!(
        relative_temporal(&context, "+3x", NaiveDate::adjust),
        Some(context)
    );
    assert_eq!(
        relative_temporal(&context, "+1d 2H", NaiveDate::adjust),
        Some(context)
    );
    assert!(matches!(
        try_relative_temporal(&context, "+1d 3.5d", NaiveDate::adjust),
        Err(AdjustError::InvalidNumber(_))
    ));
}

#[test]
fn bare_sign_and_unsigned_entries() {
    let context = date(2020, 5, 10);
    assert_eq!(relative_temporal(&context, "+", NaiveDate::adjust), Some(context));
    assert_eq!(relative_temporal(&context, "-", NaiveDate::adjust), Some(context));
    assert_eq!(relative_temporal(&context, "2020-05-11", NaiveDate::adjust), None);
}

#[test]
fn negative_expression_negates_every_token() {
    let context = date(2020, 5, 10);
    let value = relative_temporal(&context, "-1w 1d", NaiveDate::adjust).unwrap();
    assert_eq!(value, date(2020, 5, 2));
}

#[test]
fn zoned_adjustment_works_for_any_time_zone() {
    let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
    let start = plus_two.with_ymd_and_hms(2021, 1, 31, 23, 30, 0).unwrap();
    let adjust = TemporalAdjust {
        months: 1,
        minutes: 45,
        ..TemporalAdjust::default()
    };

    let adjusted = adjust.adjust_zoned_date_time(start).unwrap();
    assert_eq!(
        adjusted,
        plus_two.with_ymd_and_hms(2021, 3, 1, 0, 15, 0).unwrap()
    );
}

#[test]
fn semantics_dispatches_relative_then_absolute() {
    let semantics = TemporalSemantics::<NaiveDate>::default();
    let context = date(2024, 1, 31);

    assert_eq!(
        semantics.parse_text(Some(&context), " +1m ").unwrap(),
        date(2024, 2, 29)
    );
    assert_eq!(
        semantics.parse_text(Some(&context), "+1d 2H").unwrap(),
        context
    );
    assert_eq!(
        semantics.parse_text(Some(&context), "05-Mar-2024").unwrap(),
        date(2024, 3, 5)
    );
    assert_eq!(
        semantics.parse_text(None, "20240305").unwrap(),
        date(2024, 3, 5)
    );
}

#[test]
fn unrecognised_entry_names_text_and_type() {
    let semantics = TemporalSemantics::<DateTime<Utc>>::default();
    let err = semantics.parse_text(None, "next tuesday").unwrap_err();
    assert_eq!(
        err,
        ValueError::NotRecognized {
            text: "next tuesday".to_string(),
            type_name: "ZonedDateTime",
        }
    );
    assert_eq!(
        err.to_string(),
        "not recognized as a ZonedDateTime: next tuesday"
    );
}

#[test]
fn relative_entry_without_context_is_an_absolute_parse_failure() {
    let semantics = TemporalSemantics::<NaiveDate>::default();
    assert!(matches!(
        semantics.parse_text(None, "+1d"),
        Err(ValueError::NotRecognized { .. })
    ));
}
