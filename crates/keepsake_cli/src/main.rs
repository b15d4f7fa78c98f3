//! keepsake CLI: the `keepsake` command.
//!
//! # Responsibility
//! - Expose temporal entry parsing and snapshot history on the command line.
//! - Load configuration once and thread it into every command.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use keepsake_core::{init_logging, CoreConfig};
use log::info;

fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match CoreConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(2);
            }
        },
        None => CoreConfig::default(),
    };

    if config.logging.dir.is_some() {
        if let Err(err) = init_logging(&config.logging) {
            eprintln!("warning: file logging disabled: {err}");
        }
    }
    info!(
        "event=cli_start module=cli status=ok version={}",
        keepsake_core::core_version()
    );

    let outcome = match cli.command {
        Commands::Parse {
            kind,
            context,
            entry,
        } => commands::parse(&config, kind, context.as_deref(), &entry).map(|rendered| {
            println!("{}", rendered.display);
            println!("encoded={}", rendered.encoded);
        }),
        Commands::Adjust {
            kind,
            value,
            expression,
        } => commands::adjust(&config, kind, &value, &expression).map(|rendered| {
            println!("{}", rendered.display);
            println!("encoded={}", rendered.encoded);
        }),
        Commands::Oid { value } => commands::describe_oid(&value).map(|parts| {
            for (name, part) in parts {
                println!("{name}={part}");
            }
        }),
        Commands::History { db, oid } => commands::history(&db, &oid).map(|lines| {
            for line in lines {
                println!("{line}");
            }
        }),
    };

    if let Err(err) = outcome {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
