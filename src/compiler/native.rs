//! Compiler backed by the in-process native bridge

use super::{CompileResult, Compiler};
use crate::bridge::{Bridge, NativeBridge};
use crate::kyc::decode_hex;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// A compiler using the embedded CPython in `kython_bridge`
///
/// The bridge is injected, so several compilers (or other consumers) can
/// share one loaded library.
pub struct NativeCompiler<B: Bridge = NativeBridge> {
    bridge: Arc<B>,
}

impl<B: Bridge> NativeCompiler<B> {
    pub fn new(bridge: Arc<B>) -> Self {
        Self { bridge }
    }

    pub fn bridge(&self) -> &Arc<B> {
        &self.bridge
    }
}

impl<B: Bridge> Compiler for NativeCompiler<B> {
    fn name(&self) -> &'static str {
        "native"
    }

    fn compile_raw(
        &self,
        code: &str,
        filename: &str,
    ) -> CompileResult<Vec<u8>> {
        let started = Instant::now();
        let hex = self.bridge.compile(code, filename)?;
        let bytes = decode_hex(&hex)?;
        debug!(
            filename,
            bytes = bytes.len(),
            elapsed = ?started.elapsed(),
            "native compile finished"
        );
        Ok(bytes)
    }
}
