//! Locating and loading `kython_bridge`.
//!
//! An explicit library path is loaded as-is. Otherwise the platform file
//! name (`libkython_bridge.so`, `libkython_bridge.dylib`, `kython_bridge.dll`)
//! is tried in every configured search directory, then handed to the system
//! loader.

use super::error::{BridgeError, BridgeResult};
use super::ffi;
use crate::util::config::BridgeConfig;
use libloading::Library;
use once_cell::sync::Lazy;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Base name of the native library
pub const LIBRARY_NAME: &str = "kython_bridge";

static LIBRARY_FILENAME: Lazy<OsString> = Lazy::new(|| libloading::library_filename(LIBRARY_NAME));

/// Platform-specific file name of the native library
pub fn library_filename() -> &'static Path {
    Path::new(LIBRARY_FILENAME.as_os_str())
}

/// A library that was successfully opened, with the path it was opened from
pub(crate) struct LoadedLibrary {
    pub(crate) library: Library,
    pub(crate) path: PathBuf,
}

/// Candidate paths for a search, in the order they are tried
///
/// Search directories only contribute files that exist; the bare file
/// name is always last so the system loader gets a chance.
pub fn search_candidates(search_paths: &[PathBuf]) -> Vec<PathBuf> {
    let filename = library_filename();
    let mut candidates: Vec<PathBuf> = search_paths
        .iter()
        .map(|dir| dir.join(filename))
        .filter(|path| path.is_file())
        .collect();
    candidates.push(filename.to_path_buf());
    candidates
}

/// Load an exact library file
pub(crate) fn load_path(path: &Path) -> BridgeResult<LoadedLibrary> {
    if !path.exists() {
        return Err(BridgeError::LibraryMissing(path.to_path_buf()));
    }

    debug!(path = %path.display(), "loading native bridge");
    let library = ffi::open_library(path.as_os_str()).map_err(|source| BridgeError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "native bridge loaded");

    Ok(LoadedLibrary {
        library,
        path: path.to_path_buf(),
    })
}

/// Load the first loadable candidate from the search directories
pub(crate) fn load_search(search_paths: &[PathBuf]) -> BridgeResult<LoadedLibrary> {
    let candidates = search_candidates(search_paths);
    let mut last_error = None;

    for candidate in &candidates {
        debug!(candidate = %candidate.display(), "trying native bridge candidate");
        match ffi::open_library(candidate.as_os_str()) {
            Ok(library) => {
                info!(path = %candidate.display(), "native bridge loaded");
                return Ok(LoadedLibrary {
                    library,
                    path: candidate.clone(),
                });
            }
            Err(e) => {
                debug!(candidate = %candidate.display(), error = %e, "candidate rejected");
                last_error = Some(e);
            }
        }
    }

    Err(BridgeError::LibraryNotFound {
        name: LIBRARY_NAME.to_string(),
        searched: candidates,
        reason: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no candidates".to_string()),
    })
}

/// Load according to configuration
pub(crate) fn load(config: &BridgeConfig) -> BridgeResult<LoadedLibrary> {
    match &config.library {
        Some(path) => load_path(path),
        None => load_search(&config.search_paths),
    }
}
