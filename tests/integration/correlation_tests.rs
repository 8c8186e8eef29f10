//! Photo correlation against ingested track logs.

use geoquery::geocode::Enricher;
use geoquery::images::{ExifTimestampReader, ImageCorrelator, ImageOutcome, ImageWalker};
use geoquery::index::{Collector, LocationIndex, TimeIndex};
use geoquery::output::text::format_result;
use geoquery::resolver::{QueryEngine, ResolveOptions};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;

use super::fixtures::{write_photos, write_track};

fn engine(tracks: &TempDir) -> QueryEngine<TimeIndex, LocationIndex> {
    write_track(tracks.path());
    let mut collector = Collector::new(LocationIndex::new());
    collector.read_from_path(tracks.path()).unwrap();
    let (time_index, location_index) = collector.finish();
    QueryEngine::new(time_index, location_index, Enricher::unsupported())
}

#[test]
fn test_shallow_walk_outcomes() {
    let tracks = TempDir::new().unwrap();
    let photos = TempDir::new().unwrap();
    write_photos(photos.path());
    let mut engine = engine(&tracks);

    let walker = ImageWalker::new(photos.path(), "jpg");
    let mut skips = Vec::new();
    let report = ImageCorrelator::new(ExifTimestampReader::new())
        .correlate(&mut engine, &walker, |label, outcome| {
            if let Some(reason) = outcome.skip_reason() {
                skips.push(format!("! {label}: {reason}"));
            }
        })
        .unwrap();

    assert_eq!(report.matched, 1);
    assert_eq!(report.unreadable, 1);
    assert_eq!(report.no_match, 1);

    skips.sort();
    assert_eq!(
        skips,
        vec![
            "! IMG_0002.JPG: Unreadable/unparseable".to_string(),
            "! IMG_0003.jpg: No match".to_string(),
        ]
    );

    let lines: Vec<String> = report.results.results().iter().map(format_result).collect();
    assert_eq!(
        lines,
        vec!["IMG_0001.jpg\t2024-05-01T12:00:00Z\t(37.422000,-122.084000)".to_string()]
    );
}

#[test]
fn test_recursive_walk_with_annotation_sorted() {
    let tracks = TempDir::new().unwrap();
    let photos = TempDir::new().unwrap();
    write_photos(photos.path());
    let mut engine = engine(&tracks);

    let walker = ImageWalker::new(photos.path(), "JPG").with_recursive(true);
    let mut report = ImageCorrelator::new(ExifTimestampReader::new())
        .with_options(ResolveOptions::default().with_annotate(true))
        .correlate(&mut engine, &walker, |_, _| {})
        .unwrap();

    assert_eq!(report.matched, 2);
    assert_eq!(report.total(), 4);

    let mut out = Vec::new();
    report
        .results
        .print_to(geoquery::cli::OutputFormat::Text, &mut out)
        .unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(
        lines,
        vec![
            "IMG_0001.jpg\t2024-05-01T12:00:00Z\t[<-2024-05-01T12:02:00Z]\t(37.422000,-122.084000)",
            "day2/IMG_0100.jpg\t2024-05-01T13:00:00Z\t[<-2024-05-01T13:01:00Z]\t(37.430000,-122.090000)",
        ]
    );
}

#[test]
fn test_repeated_capture_time_hits_cache() {
    let tracks = TempDir::new().unwrap();
    let photos = TempDir::new().unwrap();
    let frame = super::fixtures::jpeg_with_datetime("2024:05:01 12:02:00");
    for i in 0..3 {
        std::fs::write(photos.path().join(format!("burst_{i}.jpg")), &frame).unwrap();
    }
    let mut engine = engine(&tracks);

    let walker = ImageWalker::new(photos.path(), "jpg");
    let report = ImageCorrelator::new(ExifTimestampReader::new())
        .correlate(&mut engine, &walker, |_, _| {})
        .unwrap();

    assert_eq!(report.matched, 3);
    assert_eq!(engine.time_stats().searches, 1);
    assert_eq!(engine.time_stats().cache_hits, 2);
}

#[test]
fn test_interrupted_walk_reports_interruption() {
    let tracks = TempDir::new().unwrap();
    let photos = TempDir::new().unwrap();
    write_photos(photos.path());
    let mut engine = engine(&tracks);

    let walker = ImageWalker::new(photos.path(), "jpg")
        .with_shutdown_flag(Arc::new(AtomicBool::new(true)));
    let report = ImageCorrelator::new(ExifTimestampReader::new())
        .correlate(&mut engine, &walker, |_, outcome| {
            assert!(!matches!(outcome, ImageOutcome::Matched(_)));
        })
        .unwrap();

    assert!(report.interrupted);
    assert_eq!(report.total(), 0);
}
