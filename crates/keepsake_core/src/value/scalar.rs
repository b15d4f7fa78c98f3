//! Scalar field values and their encode/decode facets.
//!
//! A `ValueCodec` gives a value type a lossless string form. Mementos store
//! encodable fields in that form instead of as object references.

use crate::value::temporal::OffsetTime;
use crate::value::{ValueError, ValueResult};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::fmt::Debug;

/// Value held by an encodable field.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    OffsetTime(OffsetTime),
    DateTime(NaiveDateTime),
    OffsetDateTime(DateTime<FixedOffset>),
    ZonedDateTime(DateTime<Utc>),
}

impl ScalarValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Boolean(_) => "boolean",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::OffsetTime(_) => "offset-time",
            Self::DateTime(_) => "date-time",
            Self::OffsetDateTime(_) => "offset-date-time",
            Self::ZonedDateTime(_) => "zoned-date-time",
        }
    }
}

/// Encode/decode facet for one value type.
pub trait ValueCodec: Debug + Send + Sync {
    fn type_name(&self) -> &str;

    fn to_encoded_string(&self, value: &ScalarValue) -> ValueResult<String>;

    fn from_encoded_string(&self, text: &str) -> ValueResult<ScalarValue>;
}

fn mismatch(expected: &str, found: &ScalarValue) -> ValueError {
    ValueError::UnexpectedScalar {
        expected: expected.to_string(),
        found: found.kind_name(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextCodec;

impl ValueCodec for TextCodec {
    fn type_name(&self) -> &str {
        "Text"
    }

    fn to_encoded_string(&self, value: &ScalarValue) -> ValueResult<String> {
        match value {
            ScalarValue::Text(text) => Ok(text.clone()),
            other => Err(mismatch(self.type_name(), other)),
        }
    }

    fn from_encoded_string(&self, text: &str) -> ValueResult<ScalarValue> {
        Ok(ScalarValue::Text(text.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerCodec;

impl ValueCodec for IntegerCodec {
    fn type_name(&self) -> &str {
        "Integer"
    }

    fn to_encoded_string(&self, value: &ScalarValue) -> ValueResult<String> {
        match value {
            ScalarValue::Integer(number) => Ok(number.to_string()),
            other => Err(mismatch(self.type_name(), other)),
        }
    }

    fn from_encoded_string(&self, text: &str) -> ValueResult<ScalarValue> {
        text.parse::<i64>()
            .map(ScalarValue::Integer)
            .map_err(|_| ValueError::InvalidEncoding {
                type_name: self.type_name().to_string(),
                text: text.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanCodec;

impl ValueCodec for BooleanCodec {
    fn type_name(&self) -> &str {
        "Boolean"
    }

    fn to_encoded_string(&self, value: &ScalarValue) -> ValueResult<String> {
        match value {
            ScalarValue::Boolean(flag) => Ok(flag.to_string()),
            other => Err(mismatch(self.type_name(), other)),
        }
    }

    fn from_encoded_string(&self, text: &str) -> ValueResult<ScalarValue> {
        match text {
            "true" => Ok(ScalarValue::Boolean(true)),
            "false" => Ok(ScalarValue::Boolean(false)),
            _ => Err(ValueError::InvalidEncoding {
                type_name: self.type_name().to_string(),
                text: text.to_string(),
            }),
        }
    }
}
