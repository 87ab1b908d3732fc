//! # Azyon - A Minimal Terminal Editor
//!
//! Opens, edits and saves plain-text files in a terminal, with Lua plugins
//! watching every keypress.
//!
//! ## Quick Start
//!
//! ```bash
//! # Start on the welcome screen
//! cargo run
//!
//! # Open a file (created on first save if it does not exist)
//! cargo run -- notes.txt
//!
//! # Log at debug level to the default log file
//! cargo run -- -debug notes.txt
//! ```

use anyhow::Context;
use clap::Parser;
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use azyon_core::Config;
use azyon_term::{Flags, run};

/// Azyon - a minimal terminal text editor
#[derive(Parser, Debug)]
#[command(name = "azyon")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to open; when several are given the last one is used
    #[arg(value_name = "FILE")]
    file: Vec<PathBuf>,

    /// Log at debug level (also accepted as `-debug`)
    #[arg(long)]
    debug: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log file to write to
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

impl Args {
    /// Parses arguments, accepting the single-dash `-debug` spelling.
    fn parse_normalized<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::parse_from(args.into_iter().map(Into::into).map(|arg: OsString| {
            if arg == "-debug" {
                OsString::from("--debug")
            } else {
                arg
            }
        }))
    }

    /// Maximum level written to the log.
    fn log_level(&self) -> LevelFilter {
        let level = match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        };
        if self.debug {
            level.max(LevelFilter::DEBUG)
        } else {
            level
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse_normalized(std::env::args_os());

    // An explicit config must be valid; the default one may be ignored.
    let (mut config, config_warning) = match &args.config {
        Some(path) => {
            let config = Config::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            (config, None)
        }
        None => match Config::load_default() {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        },
    };
    if let Some(log_file) = &args.log_file {
        config.log.file = Some(log_file.clone());
    }

    if args.dump_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    // The screen belongs to the editor, so logs go to a file.
    let log_path = config.log_file();
    let log_layer = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => Some(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false)
                .with_level(true),
        ),
        Err(e) => {
            eprintln!("azyon: cannot open log file {}: {}", log_path.display(), e);
            None
        }
    };

    tracing_subscriber::registry()
        .with(log_layer)
        .with(args.log_level())
        .init();

    tracing::info!("Starting Azyon v{}", env!("CARGO_PKG_VERSION"));
    if let Some(e) = config_warning {
        tracing::warn!("Ignoring config: {}", e);
    }
    if args.file.len() > 1 {
        tracing::info!(count = args.file.len(), "Several files given; opening the last one");
    }

    let flags = Flags {
        file: args.file.last().cloned(),
        config,
    };

    run(flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_normalized(["azyon"]);
        assert!(args.file.is_empty());
        assert!(!args.debug);
        assert!(!args.dump_config);
        assert_eq!(args.log_level(), LevelFilter::WARN);
    }

    #[test]
    fn test_last_file_wins() {
        let args = Args::parse_normalized(["azyon", "a.txt", "b.txt"]);
        assert_eq!(args.file.last(), Some(&PathBuf::from("b.txt")));
    }

    #[test]
    fn test_legacy_debug_flag() {
        let args = Args::parse_normalized(["azyon", "-debug", "notes.txt"]);
        assert!(args.debug);
        assert_eq!(args.file, vec![PathBuf::from("notes.txt")]);
        assert_eq!(args.log_level(), LevelFilter::DEBUG);
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(Args::parse_normalized(["azyon", "-v"]).log_level(), LevelFilter::INFO);
        assert_eq!(Args::parse_normalized(["azyon", "-vvv"]).log_level(), LevelFilter::TRACE);
        assert_eq!(Args::parse_normalized(["azyon", "-vvv", "--debug"]).log_level(), LevelFilter::TRACE);
    }

    #[test]
    fn test_config_and_log_paths() {
        let args = Args::parse_normalized([
            "azyon",
            "--config",
            "azyon.toml",
            "--log-file",
            "out.log",
            "--dump-config",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("azyon.toml")));
        assert_eq!(args.log_file, Some(PathBuf::from("out.log")));
        assert!(args.dump_config);
    }
}
