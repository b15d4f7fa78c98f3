use clap::{Parser, Subcommand};
use keepsake_core::TemporalKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "keepsake",
    about = "Temporal value entry and object snapshot tooling",
    version
)]
pub struct Cli {
    /// TOML configuration file (logging, temporal formats)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse user entry for one temporal kind
    Parse {
        /// date | time | offset-time | date-time | offset-date-time | zoned-date-time
        #[arg(long, default_value = "date")]
        kind: TemporalKind,

        /// Current value; enables relative entry such as `+1m 2d`
        #[arg(long)]
        context: Option<String>,

        /// Text as typed by the user
        #[arg(allow_hyphen_values = true)]
        entry: String,
    },

    /// Apply a relative expression strictly, reporting why it fails
    Adjust {
        #[arg(long, default_value = "date")]
        kind: TemporalKind,

        /// Starting value in any accepted absolute format
        value: String,

        /// Expression such as `+1y 2m` or `-3d`
        #[arg(allow_hyphen_values = true)]
        expression: String,
    },

    /// Validate and describe an object identity string
    Oid {
        /// `T:<type>:<id>` or `P:<type>:<id>`
        value: String,
    },

    /// List stored snapshots of one object, newest first
    History {
        /// SQLite memento store
        #[arg(long)]
        db: PathBuf,

        /// Root object identity
        oid: String,
    },
}
