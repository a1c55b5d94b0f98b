//! Hand-assembled KYC artifacts
//!
//! Mirrors what the kyc compiler emits for small modules.

/// Byte-level builder for KYC streams
#[derive(Default)]
pub struct KycBytes {
    buf: Vec<u8>,
}

impl KycBytes {
    pub fn header(python_minor: u8) -> Self {
        let mut bytes = Self::default();
        bytes.buf.extend(b"KYCA");
        bytes.buf.push(python_minor);
        bytes
    }

    pub fn none(mut self) -> Self {
        self.buf.push(b'N');
        self
    }

    pub fn int(
        mut self,
        n: i32,
    ) -> Self {
        self.buf.push(b'i');
        self.buf.extend(n.to_le_bytes());
        self
    }

    pub fn long(
        mut self,
        n: i64,
    ) -> Self {
        self.buf.push(b'L');
        self.buf.extend(n.to_le_bytes());
        self
    }

    pub fn str(
        mut self,
        s: &str,
    ) -> Self {
        self.buf.push(b's');
        self.buf.extend((s.len() as i32).to_le_bytes());
        self.buf.extend(s.as_bytes());
        self
    }

    pub fn bytes(
        mut self,
        b: &[u8],
    ) -> Self {
        self.buf.push(b'b');
        self.buf.extend((b.len() as i32).to_le_bytes());
        self.buf.extend(b);
        self
    }

    /// Tuple header; the caller appends `len` objects
    pub fn tuple(
        mut self,
        len: i32,
    ) -> Self {
        self.buf.push(b't');
        self.buf.extend(len.to_le_bytes());
        self
    }

    pub fn raw(
        mut self,
        tag: u8,
    ) -> Self {
        self.buf.push(tag);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

/// `x = 1` compiled at module level by CPython 3.9
pub fn assign_module(filename: &str) -> Vec<u8> {
    KycBytes::header(9)
        .raw(b'K')
        .long(0x5eed)
        .str("kyc 0.1")
        .raw(b'c')
        .int(0) // argcount
        .int(0) // posonlyargcount
        .int(0) // kwonlyargcount
        .int(0) // nlocals
        .int(1) // stacksize
        .int(64) // flags
        // LOAD_CONST 0; STORE_NAME 0; LOAD_CONST 1; RETURN_VALUE
        .bytes(&[100, 0, 90, 0, 100, 1, 83, 0])
        .tuple(2)
        .int(1)
        .none()
        .tuple(1)
        .str("x")
        .tuple(0)
        .tuple(0)
        .tuple(0)
        .str(filename)
        .str("<module>")
        .int(1)
        .bytes(&[])
        .build()
}

pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}
