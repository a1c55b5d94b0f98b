//! Loading and calling the native bridge
//!
//! The `stub_*` tests run against `tests/native/bridge_stub.c`, which the
//! build script compiles when a C toolchain is present. Tests marked
//! `#[ignore]` need a real build of `kython_bridge`; point
//! `KYTHON_BRIDGE_LIB` at it and run with `--ignored`.

use kython_compiler::bridge::{library_filename, Bridge, BridgeError, NativeBridge};
use kython_compiler::compiler::{Compiler, NativeCompiler};
use kython_compiler::util::config::{BridgeConfig, ENV_BRIDGE_LIB};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

/// Path of the stand-in library, if the build script produced one
fn stub_library() -> Option<&'static str> {
    let path = option_env!("KYTHON_BRIDGE_STUB");
    if path.is_none() {
        eprintln!("bridge stub was not built, skipping");
    }
    path
}

fn real_library() -> NativeBridge {
    let path = std::env::var(ENV_BRIDGE_LIB).expect("KYTHON_BRIDGE_LIB must point at kython_bridge");
    NativeBridge::open(path).expect("kython_bridge should load")
}

#[test]
fn test_missing_library_is_detected() {
    let err = NativeBridge::open("/nonexistent/dir/libkython_bridge.so").unwrap_err();
    assert!(err.is_load_failure());
}

#[test]
fn test_search_reports_candidates() {
    let dir = TempDir::new().unwrap();
    let config = BridgeConfig {
        library: None,
        search_paths: vec![dir.path().to_path_buf()],
    };

    match NativeBridge::load(&config) {
        Err(BridgeError::LibraryNotFound { name, searched, .. }) => {
            assert_eq!(name, "kython_bridge");
            assert_eq!(searched, vec![library_filename().to_path_buf()]);
        }
        // kython_bridge happens to be installed system-wide
        Ok(_) => {}
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_garbage_library_rejected() {
    let dir = TempDir::new().unwrap();
    let path: PathBuf = dir.path().join(library_filename());
    std::fs::write(&path, b"\x7fELF but not really").unwrap();

    let err = NativeBridge::open(&path).unwrap_err();
    assert!(matches!(err, BridgeError::Load { .. }));
}

#[test]
fn test_stub_compiles_empty_source() {
    let Some(path) = stub_library() else { return };
    let bridge = NativeBridge::open(path).unwrap();

    let text = bridge.compile("", "<test>").unwrap();
    assert!(!text.is_empty());

    let compiler = NativeCompiler::new(Arc::new(bridge));
    let kyc = compiler.compile_str("", "<test>").unwrap();
    assert_eq!(kyc.code.filename, "<test>");
    assert_eq!(kyc.code.name, "<module>");
    assert_eq!(kyc.python_version, 9);
}

#[test]
fn test_stub_null_result() {
    let Some(path) = stub_library() else { return };
    let bridge = NativeBridge::open(path).unwrap();

    let err = bridge.compile("null", "<test>").unwrap_err();
    assert!(matches!(err, BridgeError::NullResult));
    assert!(!err.is_load_failure());
}

#[test]
fn test_stub_invalid_utf8_result() {
    let Some(path) = stub_library() else { return };
    let bridge = NativeBridge::open(path).unwrap();

    let err = bridge.compile("badutf8", "<test>").unwrap_err();
    assert!(matches!(err, BridgeError::InvalidUtf8(_)));
}

#[test]
fn test_stub_rejects_nul_before_calling() {
    let Some(path) = stub_library() else { return };
    let bridge = NativeBridge::open(path).unwrap();

    let err = bridge.compile("null\0", "<test>").unwrap_err();
    assert!(matches!(err, BridgeError::InteriorNul { argument: "code", .. }));
}

#[test]
fn test_stub_calls_serialized_on_one_handle() {
    let Some(path) = stub_library() else { return };
    let bridge = Arc::new(NativeBridge::open(path).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let bridge = Arc::clone(&bridge);
            thread::spawn(move || bridge.compile("slow", "<test>").unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), "00");
    }
}

#[test]
fn test_stub_calls_serialized_across_handles() {
    let Some(path) = stub_library() else { return };

    // Each thread opens its own handle; the loader maps one copy of the library.
    let handles: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(move || {
                let bridge = NativeBridge::open(path).unwrap();
                (0..2)
                    .map(|_| bridge.compile("slow", "<test>").unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), vec!["00", "00"]);
    }
}

#[test]
#[ignore = "requires kython_bridge"]
fn test_real_bridge_compiles_empty_source() {
    let bridge = real_library();
    let text = bridge.compile("", "<test>").unwrap();
    assert!(!text.is_empty());
}

#[test]
#[ignore = "requires kython_bridge"]
fn test_real_bridge_is_repeatable() {
    let compiler = NativeCompiler::new(Arc::new(real_library()));
    let first = compiler.compile_str("x = 1", "<module>").unwrap();
    let second = compiler.compile_str("x = 1", "<module>").unwrap();
    assert_eq!(first.code, second.code);
    assert_eq!(first.code.names[0].as_str(), Some("x"));
}
