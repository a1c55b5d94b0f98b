//! KYC decoding errors

use thiserror::Error;

/// Decoding result
pub type KycResult<T> = Result<T, KycError>;

#[derive(Debug, Error)]
pub enum KycError {
    #[error("bad magic number {found:?}, expected \"KYC\"")]
    BadMagic { found: String },

    #[error("unsupported kyc version {0:?}, expected 'A'")]
    UnsupportedVersion(char),

    #[error("unexpected end of input at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("unknown object tag {tag:#04x} at offset {offset}")]
    UnknownTag { tag: u8, offset: usize },

    #[error("{kind} objects are not supported (offset {offset})")]
    UnsupportedTag { kind: &'static str, offset: usize },

    #[error("negative length {length} at offset {offset}")]
    NegativeLength { length: i32, offset: usize },

    #[error("invalid UTF-8 in string at offset {offset}: {source}")]
    InvalidUtf8 {
        offset: usize,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("{field}: expected {expected}, found {found}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("root object must be a kyc file, found {found}")]
    NotAFile { found: &'static str },

    #[error("objects nested deeper than {0} levels")]
    TooDeep(usize),

    #[error("failed to read kyc file: {0}")]
    Io(#[from] std::io::Error),
}
