//! KYC object model

use serde::Serialize;
use std::fmt::{self, Write as _};

/// One-byte object tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KycTag {
    // simple objects
    None,
    False,
    True,

    // numbers
    Int,
    Long,
    Float,
    Complex,

    // strings
    Bytes,
    Str,

    // containers
    Tuple,
    List,
    Dict,
    Set,
    FrozenSet,

    Code,

    /// Root object
    File,
}

impl KycTag {
    pub fn from_byte(byte: u8) -> Option<Self> {
        let tag = match byte {
            b'N' => KycTag::None,
            b'-' => KycTag::False,
            b'+' => KycTag::True,
            b'i' => KycTag::Int,
            b'L' => KycTag::Long,
            b'f' => KycTag::Float,
            b'y' => KycTag::Complex,
            b'b' => KycTag::Bytes,
            b's' => KycTag::Str,
            b't' => KycTag::Tuple,
            b'l' => KycTag::List,
            b'd' => KycTag::Dict,
            b'{' => KycTag::Set,
            b'>' => KycTag::FrozenSet,
            b'c' => KycTag::Code,
            b'K' => KycTag::File,
            _ => return None,
        };
        Some(tag)
    }

    pub fn as_byte(self) -> u8 {
        match self {
            KycTag::None => b'N',
            KycTag::False => b'-',
            KycTag::True => b'+',
            KycTag::Int => b'i',
            KycTag::Long => b'L',
            KycTag::Float => b'f',
            KycTag::Complex => b'y',
            KycTag::Bytes => b'b',
            KycTag::Str => b's',
            KycTag::Tuple => b't',
            KycTag::List => b'l',
            KycTag::Dict => b'd',
            KycTag::Set => b'{',
            KycTag::FrozenSet => b'>',
            KycTag::Code => b'c',
            KycTag::File => b'K',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            KycTag::None => "none",
            KycTag::False | KycTag::True => "bool",
            KycTag::Int => "int",
            KycTag::Long => "long",
            KycTag::Float => "float",
            KycTag::Complex => "complex",
            KycTag::Bytes => "bytes",
            KycTag::Str => "str",
            KycTag::Tuple => "tuple",
            KycTag::List => "list",
            KycTag::Dict => "dict",
            KycTag::Set => "set",
            KycTag::FrozenSet => "frozenset",
            KycTag::Code => "code",
            KycTag::File => "file",
        }
    }
}

/// A decoded object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum KycObject {
    None,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f64),
    Bytes(Vec<u8>),
    Str(String),
    Tuple(Vec<KycObject>),
    List(Vec<KycObject>),
    /// Key/value pairs in encounter order
    Dict(Vec<(KycObject, KycObject)>),
    Code(Box<KycCodeObject>),
}

impl KycObject {
    /// Kind name, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            KycObject::None => "none",
            KycObject::Bool(_) => "bool",
            KycObject::Int(_) => "int",
            KycObject::Long(_) => "long",
            KycObject::Float(_) => "float",
            KycObject::Bytes(_) => "bytes",
            KycObject::Str(_) => "str",
            KycObject::Tuple(_) => "tuple",
            KycObject::List(_) => "list",
            KycObject::Dict(_) => "dict",
            KycObject::Code(_) => "code",
        }
    }

    /// Tuple items; any other object becomes a one-element tuple
    pub fn into_tuple(self) -> Vec<KycObject> {
        match self {
            KycObject::Tuple(items) => items,
            other => vec![other],
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            KycObject::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_code(&self) -> Option<&KycCodeObject> {
        match self {
            KycObject::Code(code) => Some(code),
            _ => None,
        }
    }
}

/// Python-like repr, used by the dump output
impl fmt::Display for KycObject {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            KycObject::None => write!(f, "None"),
            KycObject::Bool(true) => write!(f, "True"),
            KycObject::Bool(false) => write!(f, "False"),
            KycObject::Int(n) => write!(f, "{}", n),
            KycObject::Long(n) => write!(f, "{}", n),
            KycObject::Float(x) => write!(f, "{:?}", x),
            KycObject::Bytes(bytes) => {
                let quote = pick_quote(bytes.contains(&b'\''), bytes.contains(&b'"'));
                write!(f, "b{}", quote)?;
                for &b in bytes {
                    match b {
                        0x20..=0x7e if b != b'\\' && b != quote as u8 => f.write_char(b as char)?,
                        _ => write_escape(f, char::from(b), quote)?,
                    }
                }
                f.write_char(quote)
            }
            KycObject::Str(s) => {
                let quote = pick_quote(s.contains('\''), s.contains('"'));
                f.write_char(quote)?;
                for c in s.chars() {
                    if c == '\\' || c == quote || c.is_control() {
                        write_escape(f, c, quote)?;
                    } else {
                        f.write_char(c)?;
                    }
                }
                f.write_char(quote)
            }
            KycObject::Tuple(items) => {
                write!(f, "(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            KycObject::List(items) => {
                write!(f, "[")?;
                write_items(f, items)?;
                write!(f, "]")
            }
            KycObject::Dict(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            KycObject::Code(code) => write!(f, "{}", code),
        }
    }
}

/// Single quotes unless only the double quote avoids escaping
fn pick_quote(
    has_single: bool,
    has_double: bool,
) -> char {
    if has_single && !has_double {
        '"'
    } else {
        '\''
    }
}

fn write_escape(
    f: &mut fmt::Formatter<'_>,
    c: char,
    quote: char,
) -> fmt::Result {
    match c {
        '\\' => f.write_str("\\\\"),
        '\n' => f.write_str("\\n"),
        '\r' => f.write_str("\\r"),
        '\t' => f.write_str("\\t"),
        c if c == quote => write!(f, "\\{}", c),
        c => write!(f, "\\x{:02x}", c as u32),
    }
}

fn write_items(
    f: &mut fmt::Formatter<'_>,
    items: &[KycObject],
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// A compiled Python code object
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KycCodeObject {
    pub arg_count: i32,
    pub posonly_arg_count: i32,
    pub kwonly_arg_count: i32,
    pub local_count: i32,
    pub stack_size: i32,
    pub flags: i32,

    /// Raw CPython bytecode
    pub bytecode: Vec<u8>,
    pub consts: Vec<KycObject>,
    pub names: Vec<KycObject>,
    pub varnames: Vec<KycObject>,
    pub freevars: Vec<KycObject>,
    pub cellvars: Vec<KycObject>,

    pub filename: String,
    pub name: String,
    pub first_line_number: i32,
    pub lnotab: Vec<u8>,
}

impl KycCodeObject {
    /// Nested code objects among the constants (functions, classes, comprehensions)
    pub fn nested_code(&self) -> impl Iterator<Item = &KycCodeObject> {
        self.consts.iter().filter_map(KycObject::as_code)
    }

    /// This code object and every code object nested inside it
    pub fn code_object_count(&self) -> usize {
        1 + self
            .nested_code()
            .map(KycCodeObject::code_object_count)
            .sum::<usize>()
    }

    /// Bytecode size summed over this and all nested code objects
    pub fn total_bytecode_len(&self) -> usize {
        self.bytecode.len()
            + self
                .nested_code()
                .map(KycCodeObject::total_bytecode_len)
                .sum::<usize>()
    }
}

impl fmt::Display for KycCodeObject {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "<code object {}, file {:?}>", self.name, self.filename)
    }
}

/// Root of a KYC artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KycFile {
    /// Minor version byte of the CPython that produced the code
    pub python_version: u8,
    /// Hash of the source recorded by the producer
    pub py_hash: i64,
    pub comment: String,
    pub code: KycCodeObject,
}

impl KycFile {
    /// One-line description: root code object, producer and sizes
    pub fn summary(&self) -> String {
        let count = self.code.code_object_count();
        format!(
            "{} from {:?}: python 3.{}, {} code object{}, {} bytes of bytecode ({})",
            self.code.name,
            self.code.filename,
            self.python_version,
            count,
            if count == 1 { "" } else { "s" },
            self.code.total_bytecode_len(),
            self.comment,
        )
    }
}
