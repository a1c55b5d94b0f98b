//! KYC compiled artifacts
//!
//! The kyc compiler hands back a hex string. Decoded, it is a small
//! marshal-like format:
//!
//! ```text
//! "KYC" 'A' <python minor version> K <long hash> <str comment> <code>
//! ```
//!
//! Objects are a one-byte tag followed by a little-endian payload; see
//! [`KycTag`] for the tag table.

pub mod dump;
pub mod error;
pub mod hex;
pub mod reader;
pub mod types;

pub use dump::dump_kyc;
pub use error::{KycError, KycResult};
pub use hex::{decode_hex, HexError};
pub use reader::{parse_kyc, KycReader, DEFAULT_MAX_DEPTH, KYC_MAGIC, KYC_VERSION};
pub use types::{KycCodeObject, KycFile, KycObject, KycTag};

use std::path::Path;

/// Parse a binary `.kyc` file from disk
pub fn read_kyc_file(path: &Path) -> KycResult<KycFile> {
    let bytes = std::fs::read(path)?;
    parse_kyc(&bytes)
}
