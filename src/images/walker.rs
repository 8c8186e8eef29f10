//! Image discovery using walkdir.
//!
//! The walk is lazy and single-threaded: one directory level by default, or
//! the whole tree when recursion is enabled. Only regular files whose
//! extension matches (case-insensitively) are yielded. Entries come out in
//! whatever order the file system lists them.
//!
//! # Example
//!
//! ```no_run
//! use geoquery::images::ImageWalker;
//! use std::path::Path;
//!
//! let walker = ImageWalker::new(Path::new("/photos/trip"), "jpg").with_recursive(true);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(path) => println!("{}", path.display()),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::WalkDir;

/// Errors enumerating the image tree. All of them end the walk.
#[derive(thiserror::Error, Debug)]
pub enum WalkError {
    /// A directory could not be listed.
    #[error("Failed to enumerate {path}: {source}")]
    Enumerate {
        /// Path being enumerated
        path: PathBuf,
        /// Underlying error
        #[source]
        source: walkdir::Error,
    },

    /// The image root is missing or not a directory.
    #[error("Image path is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Lazy walker over the images under one root.
#[derive(Debug)]
pub struct ImageWalker {
    root: PathBuf,
    extension: String,
    recursive: bool,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl ImageWalker {
    /// Create a shallow walker for files with `extension` (with or without
    /// the leading dot).
    #[must_use]
    pub fn new(root: &Path, extension: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            extension: extension.trim_start_matches('.').to_string(),
            recursive: false,
            shutdown_flag: None,
        }
    }

    /// Descend into subdirectories.
    #[must_use]
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Stop yielding entries once the flag is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Root of the walk.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Whether `path` carries the configured extension.
    #[must_use]
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }

    /// Fail early if the root cannot be walked at all.
    ///
    /// # Errors
    ///
    /// Returns [`WalkError::NotADirectory`] if the root is not a directory.
    pub fn check_root(&self) -> Result<(), WalkError> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(WalkError::NotADirectory(self.root.clone()))
        }
    }

    /// Walk the tree, yielding matching file paths.
    ///
    /// Enumeration errors are yielded as [`WalkError`]; callers treat them as
    /// fatal. Iteration ends early when shutdown is requested.
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf, WalkError>> + '_ {
        let max_depth = if self.recursive { usize::MAX } else { 1 };

        WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(false)
            .into_iter()
            .take_while(move |_| {
                let stop = self.is_shutdown_requested();
                if stop {
                    log::debug!("ImageWalker: Shutdown requested, stopping iteration");
                }
                !stop
            })
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        return None;
                    }
                    let path = entry.into_path();
                    if self.matches_extension(&path) {
                        Some(Ok(path))
                    } else {
                        log::trace!("Ignoring non-image file: {}", path.display());
                        None
                    }
                }
                Err(source) => {
                    let path = source
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    Some(Err(WalkError::Enumerate { path, source }))
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        fs::write(dir.path().join("B.JPG"), b"x").unwrap();
        fs::write(dir.path().join("c.png"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("d.jpg"), b"x").unwrap();
        fs::create_dir(dir.path().join("dir.jpg")).unwrap();
        dir
    }

    fn names(walker: &ImageWalker) -> Vec<String> {
        let mut names: Vec<String> = walker
            .walk()
            .map(|p| {
                p.unwrap()
                    .strip_prefix(walker.root())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_shallow_walk() {
        let dir = tree();
        let walker = ImageWalker::new(dir.path(), "jpg");
        assert_eq!(names(&walker), vec!["B.JPG", "a.jpg"]);
    }

    #[test]
    fn test_recursive_walk() {
        let dir = tree();
        let walker = ImageWalker::new(dir.path(), ".jpg").with_recursive(true);
        assert_eq!(names(&walker), vec!["B.JPG", "a.jpg", "sub/d.jpg"]);
    }

    #[test]
    fn test_other_extension() {
        let dir = tree();
        let walker = ImageWalker::new(dir.path(), "png");
        assert_eq!(names(&walker), vec!["c.png"]);
    }

    #[test]
    fn test_missing_root() {
        let dir = TempDir::new().unwrap();
        let walker = ImageWalker::new(&dir.path().join("nope"), "jpg");

        assert!(matches!(walker.check_root(), Err(WalkError::NotADirectory(_))));
        let first = walker.walk().next();
        assert!(matches!(first, Some(Err(WalkError::Enumerate { .. }))));
    }

    #[test]
    fn test_shutdown_stops_walk() {
        let dir = tree();
        let flag = Arc::new(AtomicBool::new(true));
        let walker = ImageWalker::new(dir.path(), "jpg").with_shutdown_flag(flag);
        assert_eq!(walker.walk().count(), 0);
    }
}
