//! Configuration layering: defaults < TOML file < environment < CLI.

use clap::Parser;
use geoquery::cli::Cli;
use geoquery::config::{Config, ConfigError, GeocoderKind};
use std::fs;
use tempfile::tempdir;

use super::fixtures::{clear_env, isolated_env};

#[test]
fn test_config_missing_file_uses_defaults() {
    let _lock = isolated_env();
    let dir = tempdir().unwrap();

    let config = Config::load_from_path(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_explicit_missing_file_is_error() {
    let _lock = isolated_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(ref missing) if *missing == path));
}

#[test]
fn test_config_hierarchy_defaults_file_env_cli() {
    let _lock = isolated_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
search_interval_secs = 120
image_extension = "jpeg"
geocoder = "nominatim"
geocode_timeout_secs = 3
"#,
    )
    .unwrap();

    std::env::set_var("GQ_IMAGE_EXTENSION", "heic");
    let mut config = Config::load(Some(&path)).unwrap();
    clear_env();

    assert_eq!(config.search_interval_secs, 120);
    assert_eq!(config.image_extension, "heic");
    assert_eq!(config.geocoder, GeocoderKind::Nominatim);
    assert_eq!(config.geocode_timeout_secs, 3);
    assert_eq!(config.metro_radius_km, 25.0);

    let cli = Cli::try_parse_from(["gq", "--tolerance", "15"]).unwrap();
    config.merge_cli(&cli).unwrap();
    assert_eq!(config.search_interval_secs, 15);
}

#[test]
fn test_config_invalid_value_reported() {
    let _lock = isolated_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "image_extension = \".\"\n").unwrap();

    let err = Config::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("image_extension"));
}

#[test]
fn test_config_roundtrips_through_toml() {
    let config = Config {
        geocoder: GeocoderKind::None,
        prompt: "gq> ".to_string(),
        ..Config::default()
    };
    let text = toml::to_string_pretty(&config).unwrap();
    assert!(text.contains("geocoder = \"none\""));
    assert!(text.contains("prompt = \"gq> \""));
}
