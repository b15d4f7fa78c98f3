//! Whole-value parse, presentation and encoding for temporal kinds.
//!
//! # Responsibility
//! - Dispatch user entry to relative parsing (when a context exists) and
//!   then to absolute parsers in fixed priority order.
//! - Render values for display and encode them losslessly for storage.
//!
//! # Invariants
//! - The encoding format is always the first absolute parser, followed by
//!   configured formats in registration order. First full match wins.
//! - Exhausting every parser yields `ValueError::NotRecognized`.

use crate::value::relative::relative_temporal;
use crate::value::scalar::{ScalarValue, ValueCodec};
use crate::value::temporal::TemporalValue;
use crate::value::{ValueError, ValueResult};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::iter;
use std::marker::PhantomData;

/// Display pattern plus ordered additional parse patterns for one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSet {
    pub display: String,
    #[serde(default)]
    pub parse: Vec<String>,
}

impl FormatSet {
    /// Rejects patterns chrono cannot interpret.
    pub fn validate(&self) -> ValueResult<()> {
        iter::once(&self.display)
            .chain(self.parse.iter())
            .try_for_each(|format| validate_format(format))
    }
}

fn validate_format(format: &str) -> ValueResult<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ValueError::InvalidFormat {
            format: format.to_string(),
        });
    }
    Ok(())
}

/// Value semantics for one temporal kind.
#[derive(Debug, Clone)]
pub struct TemporalSemantics<T: TemporalValue> {
    formats: FormatSet,
    _kind: PhantomData<fn() -> T>,
}

impl<T: TemporalValue> Default for TemporalSemantics<T> {
    fn default() -> Self {
        Self {
            formats: T::KIND.default_formats(),
            _kind: PhantomData,
        }
    }
}

impl<T: TemporalValue> TemporalSemantics<T> {
    /// Builds semantics from a validated format set.
    pub fn new(formats: FormatSet) -> ValueResult<Self> {
        formats.validate()?;
        Ok(Self {
            formats,
            _kind: PhantomData,
        })
    }

    pub fn type_name(&self) -> &'static str {
        T::KIND.type_name()
    }

    pub fn formats(&self) -> &FormatSet {
        &self.formats
    }

    /// Parses raw entry text, optionally relative to `context`.
    ///
    /// Relative entries (`+2w`) are only honoured when a context is present;
    /// they keep their case because the suffix table is case-sensitive.
    /// Absolute entries are upper-cased before matching.
    ///
    /// # Errors
    /// - `NotRecognized` when no absolute parser accepts the entry.
    pub fn parse_text(&self, context: Option<&T>, entry: &str) -> ValueResult<T> {
        let trimmed = entry.trim();
        if let Some(context) = context {
            if let Some(value) = relative_temporal(context, trimmed, T::adjust) {
                return Ok(value);
            }
        }

        let text = trimmed.to_uppercase();
        self.absolute_parsers()
            .find_map(|format| T::parse_with_format(&text, format))
            .ok_or_else(|| ValueError::NotRecognized {
                text: trimmed.to_string(),
                type_name: self.type_name(),
            })
    }

    pub fn present(&self, value: &T) -> ValueResult<String> {
        value
            .format_with(&self.formats.display)
            .ok_or_else(|| ValueError::Unpresentable {
                type_name: self.type_name(),
                format: self.formats.display.clone(),
            })
    }

    pub fn encode(&self, value: &T) -> ValueResult<String> {
        let format = T::KIND.encoding_format();
        value
            .format_with(format)
            .ok_or_else(|| ValueError::Unpresentable {
                type_name: self.type_name(),
                format: format.to_string(),
            })
    }

    pub fn restore(&self, text: &str) -> ValueResult<T> {
        T::parse_with_format(text, T::KIND.encoding_format()).ok_or_else(|| {
            ValueError::InvalidEncoding {
                type_name: self.type_name().to_string(),
                text: text.to_string(),
            }
        })
    }

    fn absolute_parsers(&self) -> impl Iterator<Item = &str> {
        iter::once(T::KIND.encoding_format()).chain(self.formats.parse.iter().map(String::as_str))
    }
}

impl<T: TemporalValue> ValueCodec for TemporalSemantics<T> {
    fn type_name(&self) -> &str {
        T::KIND.type_name()
    }

    fn to_encoded_string(&self, value: &ScalarValue) -> ValueResult<String> {
        let typed = T::from_scalar(value).ok_or_else(|| ValueError::UnexpectedScalar {
            expected: T::KIND.type_name().to_string(),
            found: value.kind_name(),
        })?;
        self.encode(&typed)
    }

    fn from_encoded_string(&self, text: &str) -> ValueResult<ScalarValue> {
        self.restore(text).map(TemporalValue::into_scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::{FormatSet, TemporalSemantics};
    use crate::value::ValueError;
    use chrono::{NaiveDate, NaiveTime};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn encoding_format_wins_over_configured_formats() {
        let semantics = TemporalSemantics::<NaiveDate>::default();
        assert_eq!(
            semantics.parse_text(None, "20200131").unwrap(),
            date(2020, 1, 31)
        );
    }

    #[test]
    fn configured_formats_are_tried_in_order() {
        let semantics = TemporalSemantics::<NaiveDate>::default();
        assert_eq!(
            semantics.parse_text(None, " 2020-01-31 ").unwrap(),
            date(2020, 1, 31)
        );
        assert_eq!(
            semantics.parse_text(None, "31/01/2020").unwrap(),
            date(2020, 1, 31)
        );
        assert_eq!(
            semantics.parse_text(None, "31 jan 2020").unwrap(),
            date(2020, 1, 31)
        );
    }

    #[test]
    fn relative_entry_needs_a_context() {
        let semantics = TemporalSemantics::<NaiveDate>::default();
        let context = date(2020, 1, 31);
        assert_eq!(
            semantics.parse_text(Some(&context), "+1m").unwrap(),
            date(2020, 2, 29)
        );

        let err = semantics.parse_text(None, "+1m").unwrap_err();
        assert_eq!(
            err,
            ValueError::NotRecognized {
                text: "+1m".to_string(),
                type_name: "Date",
            }
        );
        assert_eq!(err.to_string(), "not recognized as a Date: +1m");
    }

    #[test]
    fn time_accepts_twelve_hour_entry() {
        let semantics = TemporalSemantics::<NaiveTime>::default();
        assert_eq!(
            semantics.parse_text(None, "09:30 pm").unwrap(),
            NaiveTime::from_hms_opt(21, 30, 0).unwrap()
        );
    }

    #[test]
    fn new_rejects_malformed_patterns() {
        let formats = FormatSet {
            display: "%Y-%m-%d".to_string(),
            parse: vec!["%Q".to_string()],
        };
        let err = TemporalSemantics::<NaiveDate>::new(formats).unwrap_err();
        assert_eq!(
            err,
            ValueError::InvalidFormat {
                format: "%Q".to_string()
            }
        );
    }
}
