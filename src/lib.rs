//! gq - track-log query and photo correlation
//!
//! Loads GPS track logs (GPX, CSV) into a time index and a location index,
//! then answers time and location queries against them, either one-shot
//! from flags, interactively, or in bulk for a folder of photographs using
//! their EXIF capture times. Results can be enriched with reverse-geocoded
//! place names.
//!
//! # Modules
//!
//! - [`query`]: query parsing
//! - [`index`]: indexes and track-log ingestion
//! - [`resolver`]: memoized time resolution and location resolution
//! - [`geocode`]: reverse-geocoding providers and cache
//! - [`images`]: photo discovery and correlation
//! - [`output`]: result aggregation and formatting
//! - [`console`]: interactive query loop

pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod geocode;
pub mod images;
pub mod index;
pub mod logging;
pub mod output;
pub mod query;
pub mod resolver;
pub mod signal;

use std::io::{self, BufReader, Write};

use anyhow::Context;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::console::{Console, ConsoleExit};
use crate::error::ExitCode;
use crate::geocode::Enricher;
use crate::images::{ExifTimestampReader, ImageCorrelator, ImageWalker};
use crate::index::{Collector, LocationIndex, NearbyIndex, TimeSeries};
use crate::output::text::format_timestamp;
use crate::output::QueryResultSet;
use crate::query::{parse_location, parse_timestamp};
use crate::resolver::{MatchMode, QueryEngine, ResolveOptions};
use crate::signal::{install_handler, ShutdownHandler};

/// Message printed when no track-log source is given.
pub const MISSING_SOURCE_MESSAGE: &str = "Please provide at least one file or one path.";

/// Run the application for parsed CLI arguments.
///
/// # Errors
///
/// Returns an error for malformed query flags, unreadable track logs, an
/// unwalkable photo directory, configuration problems, or output failures.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose);

    if !cli.has_source() {
        eprintln!("{MISSING_SOURCE_MESSAGE}");
        return Ok(ExitCode::MissingSource);
    }

    let handler = install_handler()?;

    let mut config = Config::load(cli.config.as_deref())?;
    config.merge_cli(&cli)?;
    log::debug!("Configuration: {:?}", config);

    let timestamps = cli
        .timestamps
        .iter()
        .map(|raw| parse_timestamp(raw))
        .collect::<Result<Vec<_>, _>>()?;
    let locations = cli
        .locations
        .iter()
        .map(|raw| parse_location(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mut collector =
        Collector::new(LocationIndex::new().with_radius_km(config.metro_radius_km));
    for path in &cli.paths {
        collector.read_from_path(path)?;
    }
    for filepath in &cli.filepaths {
        collector.read_from_filepath(filepath)?;
    }
    let stats = collector.stats();
    log::info!(
        "Loaded {} records from {} files ({} untimed, {} files skipped)",
        stats.records,
        stats.files,
        stats.untimed,
        stats.skipped_files
    );
    let (time_index, location_index) = collector.finish();
    if let Some((first, last)) = time_index.span() {
        log::debug!(
            "Time index: {} distinct timestamps from {} to {}",
            time_index.distinct_timestamps(),
            format_timestamp(&first),
            format_timestamp(&last)
        );
    }

    let enricher = if cli.reverse_geocode {
        config
            .build_enricher()
            .context("Failed to set up reverse geocoding")?
    } else {
        Enricher::unsupported()
    };

    let mut engine = QueryEngine::new(time_index, location_index, enricher)
        .with_search_interval(config.search_interval());

    if cli.image_path.is_some() {
        return correlate_images(&cli, &config, &mut engine, &handler);
    }

    if cli.has_queries() {
        let options = ResolveOptions::default().with_enrich(cli.reverse_geocode);
        let mut results = QueryResultSet::new();

        for timestamp in timestamps {
            match engine.resolve_time(timestamp, MatchMode::Exact, options) {
                Ok(found) => results.extend(found),
                Err(e) if e.is_not_found() => eprintln!("{e}"),
                Err(e) => return Err(e.into()),
            }
        }
        for (latitude, longitude) in locations {
            match engine.resolve_location(latitude, longitude, options) {
                Ok(found) => results.extend(found),
                Err(e) if e.is_not_found() => eprintln!("{e}"),
                Err(e) => return Err(e.into()),
            }
        }

        results.print_to(cli.output, io::stdout().lock())?;
        log_geocode_stats(&engine);
        return Ok(ExitCode::Success);
    }

    let console = Console::new()
        .with_prompt(config.prompt.clone())
        .with_output_format(cli.output)
        .with_enrich(cli.reverse_geocode)
        .with_shutdown_flag(handler.get_flag());
    let exit = console.run(&mut engine, BufReader::new(io::stdin()), io::stdout())?;
    log_geocode_stats(&engine);

    Ok(match exit {
        ConsoleExit::EndOfInput => ExitCode::Success,
        ConsoleExit::Interrupted => ExitCode::Interrupted,
    })
}

fn correlate_images<T, L>(
    cli: &Cli,
    config: &Config,
    engine: &mut QueryEngine<T, L>,
    handler: &ShutdownHandler,
) -> anyhow::Result<ExitCode>
where
    T: TimeSeries,
    L: NearbyIndex,
{
    let Some(image_path) = cli.image_path.as_deref() else {
        return Ok(ExitCode::Success);
    };

    let walker = ImageWalker::new(image_path, &config.image_extension)
        .with_recursive(cli.recursive_image_walk)
        .with_shutdown_flag(handler.get_flag());
    let correlator = ImageCorrelator::new(ExifTimestampReader::new()).with_options(
        ResolveOptions::default()
            .with_enrich(cli.reverse_geocode)
            .with_annotate(cli.show_nearest_image_times),
    );

    let show_skips = cli.show_image_skips;
    let format = cli.output;
    let mut report = correlator
        .correlate(engine, &walker, |label, outcome| {
            if !show_skips {
                return;
            }
            if let Some(reason) = outcome.skip_reason() {
                // Keep stdout valid JSON when it carries the result array.
                let written = match format {
                    OutputFormat::Text => writeln!(io::stdout(), "! {label}: {reason}"),
                    OutputFormat::Json => writeln!(io::stderr(), "! {label}: {reason}"),
                };
                if let Err(e) = written {
                    log::warn!("Failed to report skipped image {label}: {e}");
                }
            }
        })
        .with_context(|| format!("Failed to correlate images in {}", image_path.display()))?;

    report.results.print_to(format, io::stdout().lock())?;
    log_geocode_stats(engine);

    if report.interrupted {
        return Ok(ExitCode::Interrupted);
    }
    Ok(ExitCode::Success)
}

fn log_geocode_stats<T: TimeSeries, L: NearbyIndex>(engine: &QueryEngine<T, L>) {
    let time = engine.time_stats();
    log::debug!(
        "Time resolver: {} searches, {} cache hits",
        time.searches,
        time.cache_hits
    );
    if let Some(cache) = engine.enricher().cache() {
        let stats = cache.stats();
        log::debug!(
            "Geocode cache: {} entries, {} hits, {} misses, {} failures",
            cache.len(),
            stats.hits,
            stats.misses,
            stats.failures
        );
    }
}
