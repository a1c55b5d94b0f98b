//! Native compiler bridge
//!
//! Binds the `kython_bridge` shared library, which embeds CPython and
//! exports a single routine:
//!
//! ```text
//! const char *kyc_compile(const char *code, const char *filename);
//! ```
//!
//! The result is a hex-encoded KYC artifact (see [`crate::kyc`]).
//!
//! A [`NativeBridge`] is an explicitly owned handle: the library stays
//! loaded for as long as the handle lives and is unloaded when it drops.
//! Share it with `Arc` rather than through global state. The native
//! library is not assumed to be thread-safe: calls are serialized across
//! every handle in the process that reaches the same loaded library, since
//! the dynamic loader maps it only once.
//!
//! # Example
//!
//! ```rust,no_run
//! use kython_compiler::bridge::{Bridge, NativeBridge};
//!
//! let bridge = NativeBridge::open("/opt/kython/lib/libkython_bridge.so")?;
//! let artifact = bridge.compile("x = 1", "<module>")?;
//! # Ok::<(), kython_compiler::bridge::BridgeError>(())
//! ```

mod error;
mod ffi;
mod loader;

pub use error::{BridgeError, BridgeResult};
pub use loader::{library_filename, search_candidates, LIBRARY_NAME};

use crate::util::config::BridgeConfig;
use ffi::BridgeSymbols;
use libloading::Library;
use parking_lot::Mutex;
use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

/// The compile entry point of a native compiler
///
/// Implemented by [`NativeBridge`]; other implementations can stand in for
/// it wherever a compiler is constructed over a bridge.
pub trait Bridge: Send + Sync {
    /// Compile `code`, attributing diagnostics to `filename`
    ///
    /// Returns the artifact text exactly as the native side produced it.
    fn compile(
        &self,
        code: &str,
        filename: &str,
    ) -> BridgeResult<String>;
}

/// Handle to a loaded `kython_bridge`
pub struct NativeBridge {
    // Field order matters: symbols must drop before the library.
    symbols: BridgeSymbols,
    call_lock: Arc<Mutex<()>>,
    path: PathBuf,
    _library: Library,
}

impl NativeBridge {
    /// Load using bridge configuration
    pub fn load(config: &BridgeConfig) -> BridgeResult<Self> {
        Self::from_loaded(loader::load(config)?)
    }

    /// Load an exact library file
    pub fn open(path: impl AsRef<Path>) -> BridgeResult<Self> {
        Self::from_loaded(loader::load_path(path.as_ref())?)
    }

    /// Search the given directories, then the system loader path
    pub fn search(search_paths: &[PathBuf]) -> BridgeResult<Self> {
        Self::from_loaded(loader::load_search(search_paths)?)
    }

    fn from_loaded(loaded: loader::LoadedLibrary) -> BridgeResult<Self> {
        let symbols = BridgeSymbols::resolve(&loaded.library, &loaded.path)?;
        Ok(Self {
            call_lock: symbols.call_lock(),
            symbols,
            path: loaded.path,
            _library: loaded.library,
        })
    }

    /// Path the library was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Bridge for NativeBridge {
    fn compile(
        &self,
        code: &str,
        filename: &str,
    ) -> BridgeResult<String> {
        let (code, filename) = to_c_args(code, filename)?;

        let _guard = self.call_lock.lock();
        let started = Instant::now();
        let result = self.symbols.kyc_compile(&code, &filename);
        trace!(elapsed = ?started.elapsed(), ok = result.is_ok(), "kyc_compile returned");
        result
    }
}

impl std::fmt::Debug for NativeBridge {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("NativeBridge")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Convert compile arguments into C strings
pub(crate) fn to_c_args(
    code: &str,
    filename: &str,
) -> BridgeResult<(CString, CString)> {
    let code = CString::new(code).map_err(|e| BridgeError::InteriorNul {
        argument: "code",
        position: e.nul_position(),
    })?;
    let filename = CString::new(filename).map_err(|e| BridgeError::InteriorNul {
        argument: "filename",
        position: e.nul_position(),
    })?;
    Ok((code, filename))
}
