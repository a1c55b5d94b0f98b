//! Decoding artifacts as the compiler hands them back

use crate::fixtures::{assign_module, to_hex, KycBytes};
use kython_compiler::kyc::{decode_hex, dump_kyc, parse_kyc, read_kyc_file, KycError, KycObject};
use tempfile::TempDir;

#[test]
fn test_decode_assign_module() {
    let kyc = parse_kyc(&assign_module("<module>")).unwrap();

    assert_eq!(kyc.python_version, 9);
    assert_eq!(kyc.py_hash, 0x5eed);
    assert_eq!(kyc.comment, "kyc 0.1");

    let code = &kyc.code;
    assert_eq!(code.name, "<module>");
    assert_eq!(code.filename, "<module>");
    assert_eq!(code.stack_size, 1);
    assert_eq!(code.consts, vec![KycObject::Int(1), KycObject::None]);
    assert_eq!(code.names, vec![KycObject::Str("x".to_string())]);
    assert!(code.varnames.is_empty());
    assert_eq!(code.bytecode.len(), 8);
    assert_eq!(code.first_line_number, 1);
}

#[test]
fn test_hex_transport_then_parse() {
    let hex = to_hex(&assign_module("/src/app.py"));
    let bytes = decode_hex(&hex).unwrap();
    let kyc = parse_kyc(&bytes).unwrap();
    assert_eq!(kyc.code.filename, "/src/app.py");

    // The subprocess backend leaves a trailing newline
    let bytes = decode_hex(&format!("{}\n", hex.to_lowercase())).unwrap();
    assert_eq!(parse_kyc(&bytes).unwrap(), kyc);
}

#[test]
fn test_read_kyc_file_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("module.kyc");
    std::fs::write(&path, assign_module("<module>")).unwrap();

    let kyc = read_kyc_file(&path).unwrap();
    assert_eq!(kyc.code.name, "<module>");
}

#[test]
fn test_read_missing_kyc_file() {
    let err = read_kyc_file(std::path::Path::new("/nonexistent/module.kyc")).unwrap_err();
    assert!(matches!(err, KycError::Io(_)));
}

#[test]
fn test_dump_output() {
    let kyc = parse_kyc(&assign_module("<module>")).unwrap();
    let mut out = Vec::new();
    dump_kyc(&kyc, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("Comment: kyc 0.1"));
    assert!(text.contains("Constants (2 entries):"));
    assert!(text.contains("[1] None"));
    assert!(text.contains("[0] 'x'"));
}

#[test]
fn test_summary_line() {
    let kyc = parse_kyc(&assign_module("/src/app.py")).unwrap();
    assert_eq!(
        kyc.summary(),
        r#"<module> from "/src/app.py": python 3.9, 1 code object, 8 bytes of bytecode (kyc 0.1)"#
    );
}

#[test]
fn test_json_output() {
    let kyc = parse_kyc(&assign_module("<module>")).unwrap();
    let json: serde_json::Value = serde_json::to_value(&kyc).unwrap();

    assert_eq!(json["code"]["name"], "<module>");
    assert_eq!(json["code"]["consts"][0]["kind"], "int");
    assert_eq!(json["code"]["consts"][0]["value"], 1);
    assert_eq!(json["code"]["consts"][1]["kind"], "none");
}

#[test]
fn test_code_field_type_checked() {
    // co_name encoded as an int
    let bytes = KycBytes::header(9)
        .raw(b'K')
        .long(0)
        .str("")
        .raw(b'c')
        .int(0)
        .int(0)
        .int(0)
        .int(0)
        .int(0)
        .int(0)
        .bytes(&[])
        .tuple(0)
        .tuple(0)
        .tuple(0)
        .tuple(0)
        .tuple(0)
        .str("<module>")
        .int(7)
        .build();

    let err = parse_kyc(&bytes).unwrap_err();
    assert!(matches!(
        err,
        KycError::TypeMismatch {
            field: "co_name",
            expected: "str",
            found: "int"
        }
    ));
}

#[test]
fn test_root_hash_must_be_long() {
    let bytes = KycBytes::header(9).raw(b'K').int(1).build();
    let err = parse_kyc(&bytes).unwrap_err();
    assert!(matches!(err, KycError::TypeMismatch { field: "py_hash", .. }));
}
