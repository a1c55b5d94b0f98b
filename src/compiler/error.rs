//! Compiler errors

use crate::bridge::BridgeError;
use crate::kyc::{HexError, KycError};
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Compiler result
pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("source file not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("compiled artifact is not valid hex: {0}")]
    Hex(#[from] HexError),

    #[error("malformed kyc artifact: {0}")]
    Kyc(#[from] KycError),

    #[error("source contains a NUL byte at position {position}, which cannot be passed on a command line")]
    InteriorNul { position: usize },

    #[error("kyc script not configured (set subprocess.script or KYTHON_KYC_SCRIPT)")]
    ScriptNotConfigured,

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} didn't exit cleanly ({status})")]
    ProcessFailed { program: String, status: ExitStatus },

    #[error("compiler returned nothing")]
    EmptyOutput,

    #[error("failed to stage source in a temporary file: {0}")]
    Staging(#[source] std::io::Error),
}
