//! Kython compiler bridge
//!
//! Compiles Python source into KYC code objects through the native
//! `kython_bridge` library (or an external CPython) and decodes the result.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use kython_compiler::bridge::NativeBridge;
//! use kython_compiler::compiler::{Compiler, NativeCompiler};
//!
//! fn main() -> kython_compiler::Result<()> {
//!     let bridge = Arc::new(NativeBridge::open("target/release/libkython_bridge.so")?);
//!     let compiler = NativeCompiler::new(bridge);
//!     let kyc = compiler.compile_str("x = 1", "<module>")?;
//!     println!("{}", kyc.code);
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/kython-compiler")]
#![warn(rust_2018_idioms)]

pub mod bridge;
pub mod compiler;
pub mod kyc;

// Utility modules
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};
pub use thiserror::Error;

use crate::compiler::load_compiler;
use crate::kyc::KycFile;
use crate::util::config::CompilerConfig;
use std::path::Path;
use tracing::debug;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tool name
pub const NAME: &str = "kyc (kython compiler)";

/// Compile a Python file with the configured backend
pub fn compile_file(
    path: &Path,
    config: &CompilerConfig,
) -> Result<KycFile> {
    debug!(path = %path.display(), "compile_file called");
    let compiler = load_compiler(config).context("Failed to load compiler backend")?;
    compiler
        .compile_path(path)
        .with_context(|| format!("Failed to compile {}", path.display()))
}

/// Compile a source string with the configured backend
pub fn compile_source(
    code: &str,
    filename: &str,
    config: &CompilerConfig,
) -> Result<KycFile> {
    let compiler = load_compiler(config).context("Failed to load compiler backend")?;
    compiler
        .compile_str(code, filename)
        .with_context(|| format!("Failed to compile {}", filename))
}
