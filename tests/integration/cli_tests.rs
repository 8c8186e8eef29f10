//! End-to-end runs of `run_app` and their exit codes.

use clap::Parser;
use geoquery::cli::Cli;
use geoquery::error::ExitCode;
use geoquery::run_app;
use tempfile::TempDir;

use super::fixtures::{isolated_env, write_photos, write_track};

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["gq"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();

    let _lock = isolated_env();
    run_app(cli)
}

fn config_file(dir: &TempDir) -> String {
    let path = dir.path().join("gq.toml");
    std::fs::write(&path, "geocoder = \"none\"\n").unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_missing_source_exits_2() {
    let code = run(&[]).unwrap();
    assert_eq!(code, ExitCode::MissingSource);
    assert_eq!(code.as_i32(), 2);
}

#[test]
fn test_timestamp_query_succeeds() {
    let dir = TempDir::new().unwrap();
    let track = write_track(dir.path());
    let config = config_file(&dir);

    let code = run(&[
        "--config",
        &config,
        "-f",
        track.to_str().unwrap(),
        "-t",
        "2024-05-01T12:00:00Z",
    ])
    .unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_unmatched_queries_still_succeed() {
    let dir = TempDir::new().unwrap();
    write_track(dir.path());
    let config = config_file(&dir);

    let code = run(&[
        "--config",
        &config,
        "-p",
        dir.path().to_str().unwrap(),
        "-t",
        "2030-01-01T00:00:00Z",
        "-l",
        "-33.86,151.21",
    ])
    .unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_malformed_timestamp_flag_is_fatal() {
    let dir = TempDir::new().unwrap();
    let track = write_track(dir.path());
    let config = config_file(&dir);

    let err = run(&[
        "--config",
        &config,
        "-f",
        track.to_str().unwrap(),
        "-t",
        "yesterday",
    ])
    .unwrap_err();
    assert!(err.to_string().contains("yesterday"));
}

#[test]
fn test_malformed_location_flag_is_fatal() {
    let dir = TempDir::new().unwrap();
    let track = write_track(dir.path());
    let config = config_file(&dir);

    assert!(run(&[
        "--config",
        &config,
        "-f",
        track.to_str().unwrap(),
        "-l",
        "37.0",
    ])
    .is_err());
}

#[test]
fn test_unsupported_track_file_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("track.kml");
    std::fs::write(&path, "<kml/>").unwrap();
    let config = config_file(&dir);

    assert!(run(&["--config", &config, "-f", path.to_str().unwrap()]).is_err());
}

#[test]
fn test_image_correlation_succeeds_with_skips() {
    let tracks = TempDir::new().unwrap();
    write_track(tracks.path());
    let photos = TempDir::new().unwrap();
    write_photos(photos.path());
    let config = config_file(&tracks);

    let code = run(&[
        "--config",
        &config,
        "-p",
        tracks.path().to_str().unwrap(),
        "-i",
        photos.path().to_str().unwrap(),
        "-r",
        "-s",
        "-n",
    ])
    .unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_missing_image_directory_is_fatal() {
    let tracks = TempDir::new().unwrap();
    write_track(tracks.path());
    let config = config_file(&tracks);

    let err = run(&[
        "--config",
        &config,
        "-p",
        tracks.path().to_str().unwrap(),
        "-i",
        tracks.path().join("no-such-dir").to_str().unwrap(),
    ])
    .unwrap_err();
    assert!(format!("{err:#}").contains("no-such-dir"));
}

#[test]
fn test_explicit_missing_config_is_fatal() {
    let dir = TempDir::new().unwrap();
    let track = write_track(dir.path());
    let missing = dir.path().join("missing.toml");

    let err = run(&[
        "--config",
        missing.to_str().unwrap(),
        "-f",
        track.to_str().unwrap(),
        "-t",
        "2024-05-01T12:00:00Z",
    ])
    .unwrap_err();
    assert!(err.to_string().contains("missing.toml"));
}

#[test]
fn test_oversized_tolerance_is_fatal() {
    let dir = TempDir::new().unwrap();
    let track = write_track(dir.path());
    let config = config_file(&dir);

    let err = run(&[
        "--config",
        &config,
        "--tolerance",
        "10000000000000000",
        "-f",
        track.to_str().unwrap(),
        "-t",
        "2024-05-01T12:00:00Z",
    ])
    .unwrap_err();
    assert!(err.to_string().contains("search_interval_secs"));
}
