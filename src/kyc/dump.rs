//! Human-readable dump of a KYC artifact

use super::types::{KycCodeObject, KycFile, KycObject};
use std::io::{self, Write};

/// Write a dump of the whole file
pub fn dump_kyc<W: Write>(
    file: &KycFile,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "--- Header ---")?;
    writeln!(out, "Python: 3.{}", file.python_version)?;
    writeln!(out, "Source hash: {:#018x}", file.py_hash)?;
    writeln!(out, "Comment: {}", file.comment)?;
    writeln!(out)?;

    dump_code(&file.code, out, 0)
}

fn dump_code<W: Write>(
    code: &KycCodeObject,
    out: &mut W,
    indent: usize,
) -> io::Result<()> {
    let pad = "  ".repeat(indent);

    writeln!(out, "{}--- Code {} ---", pad, code)?;
    writeln!(
        out,
        "{}args={} posonly={} kwonly={} locals={} stack={} flags={:#06x} firstline={}",
        pad,
        code.arg_count,
        code.posonly_arg_count,
        code.kwonly_arg_count,
        code.local_count,
        code.stack_size,
        code.flags,
        code.first_line_number
    )?;

    write_table(out, &pad, "Constants", &code.consts)?;
    write_table(out, &pad, "Names", &code.names)?;
    write_table(out, &pad, "Varnames", &code.varnames)?;
    if !code.freevars.is_empty() {
        write_table(out, &pad, "Freevars", &code.freevars)?;
    }
    if !code.cellvars.is_empty() {
        write_table(out, &pad, "Cellvars", &code.cellvars)?;
    }

    writeln!(out, "{}Bytecode ({} bytes):", pad, code.bytecode.len())?;
    for (offset, chunk) in code.bytecode.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
        writeln!(out, "{}  {:04x}  {}", pad, offset * 16, hex.join(" "))?;
    }
    writeln!(out)?;

    for nested in code.nested_code() {
        dump_code(nested, out, indent + 1)?;
    }

    Ok(())
}

fn write_table<W: Write>(
    out: &mut W,
    pad: &str,
    title: &str,
    items: &[KycObject],
) -> io::Result<()> {
    writeln!(out, "{}{} ({} entries):", pad, title, items.len())?;
    if items.is_empty() {
        writeln!(out, "{}  (empty)", pad)?;
    }
    for (i, item) in items.iter().enumerate() {
        writeln!(out, "{}  [{}] {}", pad, i, item)?;
    }
    Ok(())
}
