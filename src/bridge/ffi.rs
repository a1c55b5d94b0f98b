//! Raw foreign interface of `kython_bridge`.
//!
//! Every `unsafe` block of the crate lives in this module. The rest of the
//! crate only sees [`BridgeSymbols`] and owned Rust strings.

use super::error::{BridgeError, BridgeResult};
use libloading::Library;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ffi::{c_char, CStr, OsStr};
use std::path::Path;
use std::sync::Arc;

/// `const char *kyc_compile(const char *code, const char *filename)`
pub(crate) type KycCompileFn =
    unsafe extern "C" fn(code: *const c_char, filename: *const c_char) -> *const c_char;

/// Exported symbol names the bridge needs
pub(crate) const KYC_COMPILE: &str = "kyc_compile";

/// Call locks shared by every handle that resolved the same entry point.
///
/// The dynamic loader maps a library once per process, so handles opened
/// separately (by path, symlink or bare name) still reach the same code and
/// the same result buffer. Keying on the resolved address catches all of them.
static CALL_LOCKS: Lazy<Mutex<HashMap<usize, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Open a shared library.
pub(crate) fn open_library(path: &OsStr) -> Result<Library, libloading::Error> {
    // SAFETY: loading runs the library's initialisers. kython_bridge only
    // sets up its embedded interpreter there and takes no arguments.
    unsafe { Library::new(path) }
}

/// Function pointers resolved from a loaded library.
///
/// The pointers are only valid while the `Library` they came from is alive;
/// `NativeBridge` owns both and drops the symbols first.
#[derive(Clone, Copy)]
pub(crate) struct BridgeSymbols {
    kyc_compile: KycCompileFn,
}

impl BridgeSymbols {
    pub(crate) fn resolve(
        library: &Library,
        path: &Path,
    ) -> BridgeResult<Self> {
        // SAFETY: the declared signature matches the C prototype above.
        let kyc_compile = unsafe { library.get::<KycCompileFn>(KYC_COMPILE.as_bytes()) }
            .map(|symbol| *symbol)
            .map_err(|source| BridgeError::MissingSymbol {
                symbol: KYC_COMPILE,
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self { kyc_compile })
    }

    /// The process-wide lock guarding this entry point
    pub(crate) fn call_lock(&self) -> Arc<Mutex<()>> {
        let address = self.kyc_compile as usize;
        CALL_LOCKS.lock().entry(address).or_default().clone()
    }

    /// Call `kyc_compile` and copy the returned C string.
    ///
    /// The returned buffer stays owned by the native side and is never freed
    /// from Rust.
    pub(crate) fn kyc_compile(
        &self,
        code: &CStr,
        filename: &CStr,
    ) -> BridgeResult<String> {
        // SAFETY: both arguments are NUL-terminated and outlive the call.
        let raw = unsafe { (self.kyc_compile)(code.as_ptr(), filename.as_ptr()) };
        if raw.is_null() {
            return Err(BridgeError::NullResult);
        }

        // SAFETY: non-null results are NUL-terminated strings that remain
        // valid until the next call. The caller holds `call_lock()` across
        // this whole function, so no other call can start before the copy.
        let text = unsafe { CStr::from_ptr(raw) };
        Ok(text.to_str()?.to_owned())
    }
}
