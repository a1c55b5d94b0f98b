//! Compiler front
//!
//! [`Compiler`] turns Python source into a decoded [`KycFile`]. Two
//! backends produce the artifact:
//!
//! - [`NativeCompiler`]: calls `kyc_compile` in the loaded `kython_bridge`
//! - [`SubprocessCompiler`]: runs the kyc script under an external CPython
//!
//! Both hand back the same hex transport, which is decoded and parsed here.

mod error;
mod native;
mod subprocess;

pub use error::{CompileError, CompileResult};
pub use native::NativeCompiler;
pub use subprocess::SubprocessCompiler;

use crate::bridge::NativeBridge;
use crate::kyc::{parse_kyc, KycFile};
use crate::util::config::{Backend, CompilerConfig};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// The main interface to a Python compiler
pub trait Compiler: Send + Sync {
    /// Backend name for diagnostics
    fn name(&self) -> &'static str;

    /// Compile a string, returning the decoded artifact bytes
    fn compile_raw(
        &self,
        code: &str,
        filename: &str,
    ) -> CompileResult<Vec<u8>>;

    /// Compile a file, returning the decoded artifact bytes
    ///
    /// The absolute path is used as the filename.
    fn compile_path_raw(
        &self,
        path: &Path,
    ) -> CompileResult<Vec<u8>> {
        let (code, filename) = read_source(path)?;
        self.compile_raw(&code, &filename)
    }

    /// Compile a string into a [`KycFile`]
    fn compile_str(
        &self,
        code: &str,
        filename: &str,
    ) -> CompileResult<KycFile> {
        let bytes = self.compile_raw(code, filename)?;
        Ok(parse_kyc(&bytes)?)
    }

    /// Compile a file into a [`KycFile`]
    fn compile_path(
        &self,
        path: &Path,
    ) -> CompileResult<KycFile> {
        let bytes = self.compile_path_raw(path)?;
        Ok(parse_kyc(&bytes)?)
    }
}

/// Read a source file, returning its text and absolute path
pub fn read_source(path: &Path) -> CompileResult<(String, String)> {
    let absolute = absolute_existing(path)?;
    let code = std::fs::read_to_string(&absolute).map_err(|source| CompileError::ReadSource {
        path: absolute.clone(),
        source,
    })?;
    Ok((code, absolute.display().to_string()))
}

pub(crate) fn absolute_existing(path: &Path) -> CompileResult<std::path::PathBuf> {
    if !path.exists() {
        return Err(CompileError::SourceNotFound(path.to_path_buf()));
    }
    std::path::absolute(path).map_err(|source| CompileError::ReadSource {
        path: path.to_path_buf(),
        source,
    })
}

/// Build the compiler selected by configuration
pub fn load_compiler(config: &CompilerConfig) -> CompileResult<Box<dyn Compiler>> {
    debug!(backend = %config.backend, "loading compiler backend");
    match config.backend {
        Backend::Native => {
            let bridge = NativeBridge::load(&config.bridge)?;
            Ok(Box::new(NativeCompiler::new(Arc::new(bridge))))
        }
        Backend::Subprocess => Ok(Box::new(SubprocessCompiler::from_config(
            &config.subprocess,
        )?)),
    }
}
