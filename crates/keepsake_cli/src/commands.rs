use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use keepsake_core::db::open_db;
use keepsake_core::value::relative::try_relative_temporal;
use keepsake_core::{
    CoreConfig, Oid, OffsetTime, SnapshotService, SqliteMementoRepository, TemporalKind,
    TemporalValue,
};
use std::error::Error;
use std::path::Path;

pub type CommandResult<T> = Result<T, Box<dyn Error>>;

/// Presented and encoded forms of one parsed value.
#[derive(Debug, PartialEq, Eq)]
pub struct Rendered {
    pub display: String,
    pub encoded: String,
}

pub fn parse(
    config: &CoreConfig,
    kind: TemporalKind,
    context: Option<&str>,
    entry: &str,
) -> CommandResult<Rendered> {
    match kind {
        TemporalKind::Date => parse_as::<NaiveDate>(config, context, entry),
        TemporalKind::Time => parse_as::<NaiveTime>(config, context, entry),
        TemporalKind::OffsetTime => parse_as::<OffsetTime>(config, context, entry),
        TemporalKind::DateTime => parse_as::<NaiveDateTime>(config, context, entry),
        TemporalKind::OffsetDateTime => parse_as::<DateTime<FixedOffset>>(config, context, entry),
        TemporalKind::ZonedDateTime => parse_as::<DateTime<Utc>>(config, context, entry),
    }
}

pub fn adjust(
    config: &CoreConfig,
    kind: TemporalKind,
    value: &str,
    expression: &str,
) -> CommandResult<Rendered> {
    match kind {
        TemporalKind::Date => adjust_as::<NaiveDate>(config, value, expression),
        TemporalKind::Time => adjust_as::<NaiveTime>(config, value, expression),
        TemporalKind::OffsetTime => adjust_as::<OffsetTime>(config, value, expression),
        TemporalKind::DateTime => adjust_as::<NaiveDateTime>(config, value, expression),
        TemporalKind::OffsetDateTime => {
            adjust_as::<DateTime<FixedOffset>>(config, value, expression)
        }
        TemporalKind::ZonedDateTime => adjust_as::<DateTime<Utc>>(config, value, expression),
    }
}

pub fn describe_oid(value: &str) -> CommandResult<Vec<(&'static str, String)>> {
    let oid: Oid = value.parse()?;
    Ok(vec![
        ("type", oid.type_name().to_string()),
        ("identifier", oid.identifier().to_string()),
        (
            "state",
            if oid.is_transient() {
                "transient".to_string()
            } else {
                "persistent".to_string()
            },
        ),
    ])
}

pub fn history(db: &Path, oid: &str) -> CommandResult<Vec<String>> {
    let oid: Oid = oid.parse()?;
    let conn = open_db(db)?;
    let service = SnapshotService::new(SqliteMementoRepository::try_new(&conn)?);
    let lines = service
        .history(&oid)?
        .into_iter()
        .map(|stored| {
            format!(
                "{}  {}  {}",
                stored.id,
                DateTime::<Utc>::from_timestamp_millis(stored.created_at)
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| stored.created_at.to_string()),
                stored.label.unwrap_or_default()
            )
        })
        .collect();
    Ok(lines)
}

fn parse_as<T: TemporalValue>(
    config: &CoreConfig,
    context: Option<&str>,
    entry: &str,
) -> CommandResult<Rendered> {
    let semantics = config.temporal.semantics::<T>()?;
    let context = context
        .map(|text| semantics.parse_text(None, text))
        .transpose()?;
    let value = semantics.parse_text(context.as_ref(), entry)?;
    Ok(Rendered {
        display: semantics.present(&value)?,
        encoded: semantics.encode(&value)?,
    })
}

fn adjust_as<T: TemporalValue>(
    config: &CoreConfig,
    value: &str,
    expression: &str,
) -> CommandResult<Rendered> {
    let semantics = config.temporal.semantics::<T>()?;
    let base = semantics.parse_text(None, value)?;
    let adjusted = try_relative_temporal(&base, expression.trim(), T::adjust)?
        .ok_or_else(|| format!("`{expression}` is not a relative expression"))?;
    Ok(Rendered {
        display: semantics.present(&adjusted)?,
        encoded: semantics.encode(&adjusted)?,
    })
}
