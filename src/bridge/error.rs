//! Bridge errors

use std::path::PathBuf;
use thiserror::Error;

/// Bridge result
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised at the native boundary
#[derive(Debug, Error)]
pub enum BridgeError {
    /// An explicitly configured library file does not exist
    #[error("native library not found: {0}")]
    LibraryMissing(PathBuf),

    /// No candidate on the search path could be loaded
    #[error("could not load {name} (searched {searched:?}): {reason}")]
    LibraryNotFound {
        name: String,
        searched: Vec<PathBuf>,
        reason: String,
    },

    /// The library exists but the loader rejected it
    #[error("failed to load native library {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("symbol `{symbol}` missing from {path}: {source}")]
    MissingSymbol {
        symbol: &'static str,
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("{argument} contains a NUL byte at offset {position}")]
    InteriorNul {
        argument: &'static str,
        position: usize,
    },

    #[error("kyc_compile returned a null pointer")]
    NullResult,

    #[error("kyc_compile returned invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

impl BridgeError {
    /// True when the failure happened while locating or loading the library
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            BridgeError::LibraryMissing(_)
                | BridgeError::LibraryNotFound { .. }
                | BridgeError::Load { .. }
                | BridgeError::MissingSymbol { .. }
        )
    }
}
