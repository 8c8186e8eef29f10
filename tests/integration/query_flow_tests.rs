//! Query parsing through resolution and output, over ingested track logs.

use chrono::{Duration, TimeZone, Utc};
use geoquery::cli::OutputFormat;
use geoquery::console::{Console, ConsoleExit};
use geoquery::geocode::{Enricher, GeocodeCache, GeocodeError, GeocodeProvider, Place};
use geoquery::index::{Collector, LocationIndex, TimeIndex};
use geoquery::query::parse_query;
use geoquery::resolver::{MatchMode, QueryEngine, ResolveOptions};
use std::cell::Cell;
use std::io::Cursor;
use std::rc::Rc;
use tempfile::TempDir;

use super::fixtures::write_track;

fn indexes() -> (TimeIndex, LocationIndex) {
    let dir = TempDir::new().unwrap();
    let track = write_track(dir.path());
    let mut collector = Collector::new(LocationIndex::new());
    collector.read_from_filepath(&track).unwrap();
    collector.finish()
}

#[derive(Clone, Default)]
struct CountingProvider {
    calls: Rc<Cell<usize>>,
}

impl GeocodeProvider for CountingProvider {
    fn name(&self) -> &str {
        "counting"
    }

    fn reverse(&self, latitude: f64, longitude: f64) -> Result<Place, GeocodeError> {
        self.calls.set(self.calls.get() + 1);
        Ok(Place::new(format!("Near {latitude:.2},{longitude:.2}")))
    }
}

#[test]
fn test_parsed_time_query_resolves_nearest() {
    let (time_index, location_index) = indexes();
    let mut engine = QueryEngine::new(time_index, location_index, Enricher::unsupported());

    let query = parse_query("t 2024-05-01T12:04:59Z").unwrap();
    let results = engine.resolve(&query, ResolveOptions::default()).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(
        results.results()[0].point.timestamp,
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    );
}

#[test]
fn test_exact_mode_rejects_near_miss() {
    let (time_index, location_index) = indexes();
    let mut engine = QueryEngine::new(time_index, location_index, Enricher::unsupported());

    let near = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 1).unwrap();
    assert!(engine
        .resolve_time(near, MatchMode::Exact, ResolveOptions::default())
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_window_boundary_is_inclusive() {
    let (time_index, location_index) = indexes();
    let mut engine = QueryEngine::new(time_index, location_index, Enricher::unsupported())
        .with_search_interval(Duration::seconds(90));

    let edge = Utc.with_ymd_and_hms(2024, 5, 1, 12, 1, 30).unwrap();
    assert!(engine
        .resolve_time(edge, MatchMode::Nearest, ResolveOptions::default())
        .is_ok());

    let beyond = Utc.with_ymd_and_hms(2024, 5, 1, 12, 1, 31).unwrap();
    assert!(engine
        .resolve_time(beyond, MatchMode::Nearest, ResolveOptions::default())
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_geocode_cache_shared_across_queries() {
    let (time_index, location_index) = indexes();
    let provider = CountingProvider::default();
    let calls = Rc::clone(&provider.calls);
    let mut engine = QueryEngine::new(
        time_index,
        location_index,
        Enricher::new(GeocodeCache::new(Box::new(provider))),
    );
    let options = ResolveOptions::default().with_enrich(true);

    let by_time = engine
        .resolve_time(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            MatchMode::Exact,
            options,
        )
        .unwrap();
    let by_location = engine.resolve_location(37.422, -122.084, options).unwrap();

    assert_eq!(by_time.results()[0].place, by_location.results()[0].place);
    // Both fixes are within the metro radius; each geocodes once.
    assert_eq!(by_location.len(), 2);
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_console_session_json() {
    let (time_index, location_index) = indexes();
    let mut engine = QueryEngine::new(time_index, location_index, Enricher::unsupported());

    let mut output = Vec::new();
    let exit = Console::new()
        .with_prompt("")
        .with_output_format(OutputFormat::Json)
        .run(
            &mut engine,
            Cursor::new("2024-05-01T13:02:00Z\n".to_string()),
            &mut output,
        )
        .unwrap();
    assert_eq!(exit, ConsoleExit::EndOfInput);

    let text = String::from_utf8(output).unwrap();
    let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
    assert_eq!(value[0]["point"]["latitude"], 37.43);
    assert_eq!(value[0]["original_timestamp"], "2024-05-01T13:02:00Z");
}
