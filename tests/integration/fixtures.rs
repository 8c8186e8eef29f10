//! Shared on-disk fixtures.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[path = "../support/exif_jpeg.rs"]
mod exif_jpeg;

pub use exif_jpeg::jpeg_with_datetime;

/// Serializes tests that set `GQ_*` variables or read them through
/// `run_app`.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Take the environment lock and clear all GQ_* variables.
pub fn isolated_env() -> MutexGuard<'static, ()> {
    let guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    clear_env();
    guard
}

/// Clear all GQ_* environment variables to avoid interference.
pub fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("GQ_") {
            std::env::remove_var(key);
        }
    }
}

/// Two fixes an hour apart near Mountain View.
pub const TRACK_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <trkseg>
      <trkpt lat="37.422000" lon="-122.084000"><time>2024-05-01T12:00:00Z</time></trkpt>
      <trkpt lat="37.430000" lon="-122.090000"><time>2024-05-01T13:00:00Z</time></trkpt>
    </trkseg>
  </trk>
</gpx>
"#;

/// Write [`TRACK_GPX`] to `dir/track.gpx`.
pub fn write_track(dir: &Path) -> PathBuf {
    let path = dir.join("track.gpx");
    fs::write(&path, TRACK_GPX).unwrap();
    path
}

/// A photo folder with one matching, one unreadable and one out-of-range
/// image, plus a matching image one level down.
pub fn write_photos(dir: &Path) {
    fs::write(dir.join("IMG_0001.jpg"), jpeg_with_datetime("2024:05:01 12:02:00")).unwrap();
    fs::write(dir.join("IMG_0002.JPG"), b"truncated").unwrap();
    fs::write(dir.join("IMG_0003.jpg"), jpeg_with_datetime("2024:05:02 09:00:00")).unwrap();
    fs::write(dir.join("notes.txt"), b"not a photo").unwrap();
    fs::create_dir(dir.join("day2")).unwrap();
    fs::write(
        dir.join("day2").join("IMG_0100.jpg"),
        jpeg_with_datetime("2024:05:01 13:01:00"),
    )
    .unwrap();
}
