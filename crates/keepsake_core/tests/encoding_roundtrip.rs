//! Property tests: every temporal kind survives encode -> restore, both
//! directly and through the `ValueCodec` facet used by mementos.

use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use keepsake_core::{OffsetTime, TemporalSemantics, TemporalValue, ValueCodec};
use proptest::prelude::*;

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (1i32..=9999, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).expect("day 1..=28 always exists"))
}

fn time_strategy() -> impl Strategy<Value = NaiveTime> {
    (0u32..24, 0u32..60, 0u32..60, 0u32..1_000_000_000).prop_map(|(h, m, s, nanos)| {
        NaiveTime::from_hms_nano_opt(h, m, s, nanos).expect("components are in range")
    })
}

/// `%z` carries whole minutes only.
fn offset_strategy() -> impl Strategy<Value = FixedOffset> {
    (-1439i32..=1439)
        .prop_map(|minutes| FixedOffset::east_opt(minutes * 60).expect("offset under a day"))
}

fn assert_round_trip<T: TemporalValue>(value: T) -> Result<(), TestCaseError> {
    let semantics = TemporalSemantics::<T>::default();
    let encoded = semantics.encode(&value).expect("encodable");
    prop_assert_eq!(semantics.restore(&encoded).expect("restorable"), value.clone());

    let scalar = value.clone().into_scalar();
    let through_codec = semantics
        .from_encoded_string(&semantics.to_encoded_string(&scalar).expect("codec encodes"))
        .expect("codec decodes");
    prop_assert_eq!(through_codec, scalar);
    Ok(())
}

proptest! {
    #[test]
    fn date_round_trips(date in date_strategy()) {
        assert_round_trip(date)?;
    }

    #[test]
    fn time_round_trips(time in time_strategy()) {
        assert_round_trip(time)?;
    }

    #[test]
    fn offset_time_round_trips(time in time_strategy(), offset in offset_strategy()) {
        assert_round_trip(OffsetTime::new(time, offset))?;
    }

    #[test]
    fn date_time_round_trips(date in date_strategy(), time in time_strategy()) {
        assert_round_trip(NaiveDateTime::new(date, time))?;
    }

    #[test]
    fn offset_date_time_round_trips(
        date in date_strategy(),
        time in time_strategy(),
        offset in offset_strategy(),
    ) {
        let value: DateTime<FixedOffset> = offset
            .from_local_datetime(&NaiveDateTime::new(date, time))
            .single()
            .expect("fixed offsets are unambiguous");
        assert_round_trip(value)?;
    }

    #[test]
    fn zoned_date_time_round_trips(date in date_strategy(), time in time_strategy()) {
        assert_round_trip(NaiveDateTime::new(date, time).and_utc())?;
    }
}

#[test]
fn encoded_forms_are_compact_and_sortable() {
    let semantics = TemporalSemantics::<NaiveDateTime>::default();
    let value = NaiveDate::from_ymd_opt(2024, 2, 29)
        .unwrap()
        .and_hms_milli_opt(13, 5, 9, 250)
        .unwrap();
    assert_eq!(semantics.encode(&value).unwrap(), "20240229T130509.250");

    let zoned = TemporalSemantics::<DateTime<Utc>>::default();
    let instant = Utc.with_ymd_and_hms(2024, 2, 29, 13, 5, 9).unwrap();
    assert_eq!(zoned.encode(&instant).unwrap(), "20240229T130509+0000");
}
