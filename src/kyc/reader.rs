//! KYC decoder
//!
//! Reads the little-endian object stream produced by the kyc compiler.

use super::error::{KycError, KycResult};
use super::types::{KycCodeObject, KycFile, KycObject, KycTag};
use tracing::debug;

/// File magic
pub const KYC_MAGIC: &[u8; 3] = b"KYC";
/// Supported format version
pub const KYC_VERSION: u8 = b'A';
/// Default nesting limit for containers and code objects
///
/// Decoding recurses once per level; this keeps a debug build within a
/// 2 MiB thread stack even when every level is a code object.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Cursor over an encoded artifact
pub struct KycReader<'a> {
    buf: &'a [u8],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> KycReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_max_depth(buf, DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(
        buf: &'a [u8],
        max_depth: usize,
    ) -> Self {
        Self {
            buf,
            pos: 0,
            depth: 0,
            max_depth,
        }
    }

    /// Current offset into the buffer
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes not consumed yet
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(
        &mut self,
        n: usize,
    ) -> KycResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(KycError::Truncated {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> KycResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_u8(&mut self) -> KycResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_i32(&mut self) -> KycResult<i32> {
        self.take_array().map(i32::from_le_bytes)
    }

    fn read_i64(&mut self) -> KycResult<i64> {
        self.take_array().map(i64::from_le_bytes)
    }

    fn read_f64(&mut self) -> KycResult<f64> {
        self.take_array().map(f64::from_le_bytes)
    }

    fn read_len(&mut self) -> KycResult<usize> {
        let offset = self.pos;
        let length = self.read_i32()?;
        usize::try_from(length).map_err(|_| KycError::NegativeLength { length, offset })
    }

    /// Read and validate the file header, returning the Python version byte
    pub fn read_header(&mut self) -> KycResult<u8> {
        let magic = self.take(KYC_MAGIC.len())?;
        if magic != KYC_MAGIC {
            return Err(KycError::BadMagic {
                found: String::from_utf8_lossy(magic).into_owned(),
            });
        }

        let version = self.read_u8()?;
        if version != KYC_VERSION {
            return Err(KycError::UnsupportedVersion(version as char));
        }

        self.read_u8()
    }

    /// Read the root `K` object
    pub fn read_file(
        &mut self,
        python_version: u8,
    ) -> KycResult<KycFile> {
        let offset = self.pos;
        let byte = self.read_u8()?;
        match KycTag::from_byte(byte) {
            Some(KycTag::File) => {}
            Some(tag) => return Err(KycError::NotAFile { found: tag.name() }),
            None => return Err(KycError::UnknownTag { tag: byte, offset }),
        }

        let py_hash = match self.read_object()? {
            KycObject::Long(hash) => hash,
            other => return Err(mismatch("py_hash", "long", &other)),
        };
        let comment = self.expect_str("comment")?;
        let code = match self.read_object()? {
            KycObject::Code(code) => *code,
            other => return Err(mismatch("code", "code", &other)),
        };

        Ok(KycFile {
            python_version,
            py_hash,
            comment,
            code,
        })
    }

    /// Read one object
    pub fn read_object(&mut self) -> KycResult<KycObject> {
        let offset = self.pos;
        let byte = self.read_u8()?;
        let tag = KycTag::from_byte(byte).ok_or(KycError::UnknownTag { tag: byte, offset })?;

        let object = match tag {
            KycTag::None => KycObject::None,
            KycTag::False => KycObject::Bool(false),
            KycTag::True => KycObject::Bool(true),

            KycTag::Int => KycObject::Int(self.read_i32()?),
            KycTag::Long => KycObject::Long(self.read_i64()?),
            KycTag::Float => KycObject::Float(self.read_f64()?),

            KycTag::Bytes => KycObject::Bytes(self.read_bytes()?),
            KycTag::Str => KycObject::Str(self.read_string()?),

            KycTag::Tuple => KycObject::Tuple(self.nested(Self::read_sequence)?),
            KycTag::List => KycObject::List(self.nested(Self::read_sequence)?),
            KycTag::Dict => KycObject::Dict(self.nested(Self::read_dict)?),
            KycTag::Code => KycObject::Code(Box::new(self.nested(Self::read_code)?)),

            KycTag::Complex | KycTag::Set | KycTag::FrozenSet | KycTag::File => {
                return Err(KycError::UnsupportedTag {
                    kind: tag.name(),
                    offset,
                });
            }
        };

        Ok(object)
    }

    fn nested<T>(
        &mut self,
        read: fn(&mut Self) -> KycResult<T>,
    ) -> KycResult<T> {
        if self.depth >= self.max_depth {
            return Err(KycError::TooDeep(self.max_depth));
        }
        self.depth += 1;
        let result = read(self);
        self.depth -= 1;
        result
    }

    fn read_bytes(&mut self) -> KycResult<Vec<u8>> {
        let len = self.read_len()?;
        Ok(self.take(len)?.to_vec())
    }

    fn read_string(&mut self) -> KycResult<String> {
        let len = self.read_len()?;
        let offset = self.pos;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|source| KycError::InvalidUtf8 { offset, source })
    }

    fn read_sequence(&mut self) -> KycResult<Vec<KycObject>> {
        let len = self.read_len()?;
        // Every object takes at least one byte, so cap the preallocation.
        let mut items = Vec::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            items.push(self.read_object()?);
        }
        Ok(items)
    }

    fn read_dict(&mut self) -> KycResult<Vec<(KycObject, KycObject)>> {
        let len = self.read_len()?;
        let mut pairs = Vec::with_capacity(len.min(self.remaining() / 2));
        for _ in 0..len {
            let key = self.read_object()?;
            let value = self.read_object()?;
            pairs.push((key, value));
        }
        Ok(pairs)
    }

    fn read_code(&mut self) -> KycResult<KycCodeObject> {
        let arg_count = self.expect_int("co_argcount")?;
        let posonly_arg_count = self.expect_int("co_posonlyargcount")?;
        let kwonly_arg_count = self.expect_int("co_kwonlyargcount")?;
        let local_count = self.expect_int("co_nlocals")?;
        let stack_size = self.expect_int("co_stacksize")?;
        let flags = self.expect_int("co_flags")?;

        let bytecode = self.expect_bytes("co_code")?;
        let consts = self.read_object()?.into_tuple();
        let names = self.read_object()?.into_tuple();
        let varnames = self.read_object()?.into_tuple();
        let freevars = self.read_object()?.into_tuple();
        let cellvars = self.read_object()?.into_tuple();

        let filename = self.expect_str("co_filename")?;
        let name = self.expect_str("co_name")?;
        let first_line_number = self.expect_int("co_firstlineno")?;
        let lnotab = self.expect_bytes("co_lnotab")?;

        Ok(KycCodeObject {
            arg_count,
            posonly_arg_count,
            kwonly_arg_count,
            local_count,
            stack_size,
            flags,
            bytecode,
            consts,
            names,
            varnames,
            freevars,
            cellvars,
            filename,
            name,
            first_line_number,
            lnotab,
        })
    }

    fn expect_int(
        &mut self,
        field: &'static str,
    ) -> KycResult<i32> {
        match self.read_object()? {
            KycObject::Int(n) => Ok(n),
            other => Err(mismatch(field, "int", &other)),
        }
    }

    fn expect_str(
        &mut self,
        field: &'static str,
    ) -> KycResult<String> {
        match self.read_object()? {
            KycObject::Str(s) => Ok(s),
            other => Err(mismatch(field, "str", &other)),
        }
    }

    fn expect_bytes(
        &mut self,
        field: &'static str,
    ) -> KycResult<Vec<u8>> {
        match self.read_object()? {
            KycObject::Bytes(b) => Ok(b),
            other => Err(mismatch(field, "bytes", &other)),
        }
    }
}

fn mismatch(
    field: &'static str,
    expected: &'static str,
    found: &KycObject,
) -> KycError {
    KycError::TypeMismatch {
        field,
        expected,
        found: found.kind(),
    }
}

/// Parse a complete KYC artifact
pub fn parse_kyc(bytes: &[u8]) -> KycResult<KycFile> {
    let mut reader = KycReader::new(bytes);
    let python_version = reader.read_header()?;
    let file = reader.read_file(python_version)?;

    if reader.remaining() > 0 {
        debug!(
            trailing = reader.remaining(),
            "ignoring trailing bytes after kyc root object"
        );
    }

    Ok(file)
}
