//! Value semantics: scalar codecs, temporal parsing and relative adjustment.
//!
//! # Responsibility
//! - Parse user-entered text into typed values, with `+3d`-style relative
//!   entry against a context value.
//! - Provide lossless encode/decode for values stored inside mementos.
//!
//! # Invariants
//! - Relative parsing never partially applies an expression.
//! - Configured formats are passed in explicitly; nothing here reads
//!   process-global locale state.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod adjust;
pub mod relative;
pub mod scalar;
pub mod semantics;
pub mod temporal;

pub type ValueResult<T> = Result<T, ValueError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// User-facing: no absolute parser accepted the entry.
    NotRecognized {
        text: String,
        type_name: &'static str,
    },
    /// Stored encoding could not be decoded.
    InvalidEncoding { type_name: String, text: String },
    /// A codec was handed a scalar of another kind.
    UnexpectedScalar {
        expected: String,
        found: &'static str,
    },
    /// A configured strftime pattern is malformed.
    InvalidFormat { format: String },
    /// Value cannot be rendered with the configured pattern.
    Unpresentable {
        type_name: &'static str,
        format: String,
    },
}

impl Display for ValueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotRecognized { text, type_name } => {
                write!(f, "not recognized as a {type_name}: {text}")
            }
            Self::InvalidEncoding { type_name, text } => {
                write!(f, "invalid encoded {type_name} value `{text}`")
            }
            Self::UnexpectedScalar { expected, found } => {
                write!(f, "expected a {expected} value, got {found}")
            }
            Self::InvalidFormat { format } => write!(f, "invalid format pattern `{format}`"),
            Self::Unpresentable { type_name, format } => {
                write!(f, "cannot render {type_name} with pattern `{format}`")
            }
        }
    }
}

impl Error for ValueError {}
