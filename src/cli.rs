//! Command-line interface definitions for gq.
//!
//! This module defines all CLI arguments using the clap derive API.
//!
//! # Example
//!
//! ```bash
//! # Interactive console over a directory of track logs
//! gq -p ~/tracks
//!
//! # One-shot queries with place names
//! gq -f day1.gpx -t 2024-05-01T12:00:00Z -l 37.42,-122.08 -g
//!
//! # Tag every photo in a trip folder, including subfolders
//! gq -p ~/tracks -i ~/photos/trip -r -s
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Correlate track logs with times, places and photos.
///
/// gq loads GPX and CSV track logs, then answers "where was I at time T" and
/// "when was I near this coordinate" queries, either from flags, from an
/// interactive console, or in bulk for a folder of photos.
#[derive(Debug, Parser)]
#[command(name = "gq")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory of track-log files (can be specified multiple times)
    #[arg(short, long = "path", value_name = "DIR")]
    pub paths: Vec<PathBuf>,

    /// Single track-log file (can be specified multiple times)
    #[arg(short = 'f', long = "filepath", value_name = "FILE")]
    pub filepaths: Vec<PathBuf>,

    /// Exact timestamp to look up, RFC 3339 (can be specified multiple times)
    #[arg(short, long = "timestamp", value_name = "RFC3339")]
    pub timestamps: Vec<String>,

    /// Coordinate to look up as lat,lon (can be specified multiple times)
    #[arg(short, long = "location", value_name = "LAT,LON", allow_hyphen_values = true)]
    pub locations: Vec<String>,

    /// Attach a place name to every result
    #[arg(short = 'g', long)]
    pub reverse_geocode: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Directory of photos to correlate by capture time
    #[arg(short, long, value_name = "DIR")]
    pub image_path: Option<PathBuf>,

    /// Descend into subdirectories of the photo directory
    #[arg(short, long, requires = "image_path")]
    pub recursive_image_walk: bool,

    /// Print a line for every photo that could not be matched
    #[arg(short, long, requires = "image_path")]
    pub show_image_skips: bool,

    /// Show the photo's own time next to the fix it was snapped to
    #[arg(short = 'n', long, requires = "image_path")]
    pub show_nearest_image_times: bool,

    /// Path to a configuration file
    ///
    /// If not specified, `config.toml` in the platform config directory is
    /// used when present.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Nearest-match tolerance in seconds (overrides configuration)
    #[arg(long, value_name = "SECONDS")]
    pub tolerance: Option<u64>,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

impl Cli {
    /// Whether any track-log source was given.
    #[must_use]
    pub fn has_source(&self) -> bool {
        !self.paths.is_empty() || !self.filepaths.is_empty()
    }

    /// Whether any one-shot query flag was given.
    #[must_use]
    pub fn has_queries(&self) -> bool {
        !self.timestamps.is_empty() || !self.locations.is_empty()
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Tab-delimited lines
    #[default]
    Text,
    /// Pretty-printed JSON array
    Json,
}
