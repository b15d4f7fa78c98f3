//! Core configuration loaded from TOML.
//!
//! # Responsibility
//! - Carry logging settings and per-kind temporal format sets.
//! - Build `TemporalSemantics` from configured formats.
//!
//! # Invariants
//! - Every section is optional; missing sections take built-in defaults.
//! - Format patterns are validated on load, not on first use.
//!
//! Example:
//!
//! ```toml
//! [logging]
//! level = "debug"
//! dir = "/var/log/keepsake"
//!
//! [temporal.date]
//! display = "%d/%m/%Y"
//! parse = ["%d/%m/%Y", "%Y-%m-%d"]
//! ```

use crate::logging::default_log_level;
use crate::value::semantics::{FormatSet, TemporalSemantics};
use crate::value::temporal::{TemporalKind, TemporalValue};
use crate::value::{ValueError, ValueResult};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    InvalidFormat {
        kind: TemporalKind,
        source: ValueError,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::InvalidFormat { kind, source } => {
                write!(f, "invalid [temporal.{kind}] section: {source}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::InvalidFormat { source, .. } => Some(source),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub logging: LoggingConfig,
    pub temporal: TemporalConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rolling log files. No file logging when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct TemporalConfig {
    pub date: FormatSet,
    pub time: FormatSet,
    pub offset_time: FormatSet,
    pub date_time: FormatSet,
    pub offset_date_time: FormatSet,
    pub zoned_date_time: FormatSet,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            date: TemporalKind::Date.default_formats(),
            time: TemporalKind::Time.default_formats(),
            offset_time: TemporalKind::OffsetTime.default_formats(),
            date_time: TemporalKind::DateTime.default_formats(),
            offset_date_time: TemporalKind::OffsetDateTime.default_formats(),
            zoned_date_time: TemporalKind::ZonedDateTime.default_formats(),
        }
    }
}

impl TemporalConfig {
    pub fn formats(&self, kind: TemporalKind) -> &FormatSet {
        match kind {
            TemporalKind::Date => &self.date,
            TemporalKind::Time => &self.time,
            TemporalKind::OffsetTime => &self.offset_time,
            TemporalKind::DateTime => &self.date_time,
            TemporalKind::OffsetDateTime => &self.offset_date_time,
            TemporalKind::ZonedDateTime => &self.zoned_date_time,
        }
    }

    pub fn semantics<T: TemporalValue>(&self) -> ValueResult<TemporalSemantics<T>> {
        TemporalSemantics::new(self.formats(T::KIND).clone())
    }

    fn validate(&self) -> ConfigResult<()> {
        for kind in TemporalKind::ALL {
            self.formats(kind)
                .validate()
                .map_err(|source| ConfigError::InvalidFormat { kind, source })?;
        }
        Ok(())
    }
}

impl CoreConfig {
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: CoreConfig = toml::from_str(text)?;
        config.temporal.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use crate::value::temporal::TemporalKind;
    use chrono::NaiveDate;

    #[test]
    fn empty_document_uses_defaults() {
        let config = CoreConfig::from_toml_str("").expect("empty config should parse");
        assert_eq!(config, CoreConfig::default());
        assert!(config.logging.dir.is_none());
    }

    #[test]
    fn temporal_section_overrides_one_kind() {
        let config = CoreConfig::from_toml_str(
            r#"
            [temporal.date]
            display = "%d/%m/%Y"
            parse = ["%d/%m/%Y"]
            "#,
        )
        .expect("config should parse");

        let semantics = config
            .temporal
            .semantics::<NaiveDate>()
            .expect("formats are valid");
        let date = semantics.parse_text(None, "07/03/2024").expect("parses");
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        assert_eq!(semantics.present(&date).unwrap(), "07/03/2024");
        assert_eq!(
            config.temporal.formats(TemporalKind::Time),
            &TemporalKind::Time.default_formats()
        );
    }

    #[test]
    fn kebab_case_section_names() {
        let config = CoreConfig::from_toml_str(
            r#"
            [temporal.offset-date-time]
            display = "%Y-%m-%d %H:%M %:z"
            "#,
        )
        .expect("config should parse");
        assert!(config.temporal.offset_date_time.parse.is_empty());
    }

    #[test]
    fn malformed_pattern_is_rejected_on_load() {
        let err = CoreConfig::from_toml_str(
            r#"
            [temporal.time]
            display = "%Q"
            "#,
        )
        .expect_err("bad pattern must fail");
        assert!(matches!(
            err,
            ConfigError::InvalidFormat {
                kind: TemporalKind::Time,
                ..
            }
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = CoreConfig::from_toml_str("[logging]\nverbose = true\n")
            .expect_err("unknown key must fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
