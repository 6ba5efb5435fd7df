//! Command-line interface parsing for the fare collector
//!
//! This module handles parsing of CLI arguments using clap. Two invocations are
//! supported: a single lookup (`ORIGIN DESTINATION DATE TIME`) and a batch run
//! over a route file (`--load ROUTE_FILE DATE TIME`).

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::Parser;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::{default_cache_dir, CacheKeyPolicy};
use crate::data::trip::DEFAULT_ENDPOINT;

/// Error types for CLI argument interpretation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// The date is not `YYYY-MM-DD`
    #[error("Not a valid date: '{0}'.")]
    InvalidDate(String),

    /// The time is not `HH:MM`
    #[error("Not a valid time: '{0}'.")]
    InvalidTime(String),

    /// Positional arguments do not match the requested mode
    #[error("Expected {expected}, got {got} positional argument(s)")]
    WrongArgCount { expected: &'static str, got: usize },
}

/// Get bus fares for NJ Transit
#[derive(Parser, Debug)]
#[command(name = "njfare")]
#[command(about = "Get bus fares for NJ Transit")]
#[command(version)]
pub struct Cli {
    /// ORIGIN DESTINATION DATE TIME for one lookup, or DATE TIME with --load
    ///
    /// Examples:
    ///   njfare ORANGE "EAST ORANGE" 2019-10-09 09:30
    ///   njfare --load routes.csv 2019-10-09 09:30
    #[arg(value_name = "ARGS", num_args = 0..=4)]
    pub args: Vec<String>,

    /// Route CSV; looks up every town pair of every route
    #[arg(long, value_name = "ROUTE_FILE")]
    pub load: Option<PathBuf>,

    /// Where the batch report is written
    #[arg(long, value_name = "FILE", default_value = "output.csv")]
    pub output: PathBuf,

    /// Page cache directory (defaults to the user cache directory)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Always fetch fresh pages; they are still written to the cache
    #[arg(long)]
    pub no_cache: bool,

    /// Include the departure time in cache keys
    #[arg(long)]
    pub key_with_time: bool,

    /// CSV of `name,selector` rows replacing the built-in stop list
    #[arg(long, value_name = "FILE")]
    pub stops: Option<PathBuf>,

    /// Trip planner URL
    #[arg(long, value_name = "URL", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Log level: off, error, warn, info, debug or trace (RUST_LOG overrides)
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    pub log_level: LevelFilter,
}

/// What the run should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Look up one origin/destination pair
    Single { origin: String, destination: String },
    /// Look up all pairs from a route file
    Batch { route_file: PathBuf },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub mode: Mode,
    /// Departure date and time
    pub when: NaiveDateTime,
    pub output: PathBuf,
    pub cache_dir: PathBuf,
    /// Whether cached pages may be served
    pub use_cache: bool,
    pub key_policy: CacheKeyPolicy,
    pub stops_file: Option<PathBuf>,
    pub endpoint: String,
    pub log_level: LevelFilter,
}

/// Parses a `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| CliError::InvalidDate(s.to_string()))
}

/// Parses a 24-hour `HH:MM` time
pub fn parse_time(s: &str) -> Result<NaiveTime, CliError> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| CliError::InvalidTime(s.to_string()))
}

impl RunConfig {
    /// Creates a RunConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(RunConfig)` when the positionals match the mode
    /// * `Err(CliError)` for a wrong argument count or a bad date/time
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let (mode, date, time) = match (&cli.load, cli.args.as_slice()) {
            (Some(route_file), [date, time]) => (
                Mode::Batch {
                    route_file: route_file.clone(),
                },
                date,
                time,
            ),
            (Some(_), args) => {
                return Err(CliError::WrongArgCount {
                    expected: "DATE TIME with --load",
                    got: args.len(),
                })
            }
            (None, [origin, destination, date, time]) => (
                Mode::Single {
                    origin: origin.clone(),
                    destination: destination.clone(),
                },
                date,
                time,
            ),
            (None, args) => {
                return Err(CliError::WrongArgCount {
                    expected: "ORIGIN DESTINATION DATE TIME",
                    got: args.len(),
                })
            }
        };

        let when = parse_date(date)?.and_time(parse_time(time)?);
        let key_policy = if cli.key_with_time {
            CacheKeyPolicy::WithTime
        } else {
            CacheKeyPolicy::PairOnly
        };

        Ok(RunConfig {
            mode,
            when,
            output: cli.output.clone(),
            cache_dir: cli.cache_dir.clone().unwrap_or_else(default_cache_dir),
            use_cache: !cli.no_cache,
            key_policy,
            stops_file: cli.stops.clone(),
            endpoint: cli.endpoint.clone(),
            log_level: cli.log_level,
        })
    }
}
