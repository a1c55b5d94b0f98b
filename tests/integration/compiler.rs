//! Compiler front over an injected bridge

use crate::fixtures::{assign_module, to_hex};
use kython_compiler::bridge::{Bridge, BridgeError, BridgeResult};
use kython_compiler::compiler::{CompileError, Compiler, NativeCompiler};
use kython_compiler::util::config::{Backend, CompilerConfig};
use kython_compiler::{compile_file, compile_source};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

/// Answers every call with `x = 1` compiled under the requested filename
#[derive(Default)]
struct EchoBridge {
    calls: AtomicUsize,
    last_code: Mutex<Option<String>>,
}

impl Bridge for EchoBridge {
    fn compile(
        &self,
        code: &str,
        filename: &str,
    ) -> BridgeResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_code.lock() = Some(code.to_string());
        Ok(to_hex(&assign_module(filename)))
    }
}

struct NullBridge;

impl Bridge for NullBridge {
    fn compile(
        &self,
        _code: &str,
        _filename: &str,
    ) -> BridgeResult<String> {
        Err(BridgeError::NullResult)
    }
}

#[test]
fn test_compile_str() {
    let bridge = Arc::new(EchoBridge::default());
    let compiler = NativeCompiler::new(bridge.clone());

    let kyc = compiler.compile_str("x = 1", "<module>").unwrap();
    assert_eq!(kyc.code.filename, "<module>");
    assert_eq!(bridge.last_code.lock().as_deref(), Some("x = 1"));
}

#[test]
fn test_compile_empty_source() {
    let compiler = NativeCompiler::new(Arc::new(EchoBridge::default()));
    assert!(compiler.compile_str("", "<test>").is_ok());
}

#[test]
fn test_repeated_calls_are_independent() {
    let bridge = Arc::new(EchoBridge::default());
    let compiler = NativeCompiler::new(bridge.clone());

    let first = compiler.compile_str("x = 1", "<module>").unwrap();
    let second = compiler.compile_str("x = 1", "<module>").unwrap();
    assert_eq!(first, second);
    assert_eq!(bridge.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_compile_path_uses_absolute_filename() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.py");
    std::fs::write(&path, "x = 1\n").unwrap();

    let bridge = Arc::new(EchoBridge::default());
    let compiler = NativeCompiler::new(bridge.clone());
    let kyc = compiler.compile_path(&path).unwrap();

    assert!(PathBuf::from(&kyc.code.filename).is_absolute());
    assert!(kyc.code.filename.ends_with("app.py"));
    assert_eq!(bridge.last_code.lock().as_deref(), Some("x = 1\n"));
}

#[test]
fn test_compile_missing_path() {
    let compiler = NativeCompiler::new(Arc::new(EchoBridge::default()));
    let err = compiler
        .compile_path(std::path::Path::new("/nonexistent/app.py"))
        .unwrap_err();
    assert!(matches!(err, CompileError::SourceNotFound(_)));
}

#[test]
fn test_null_result_surfaces() {
    let compiler = NativeCompiler::new(Arc::new(NullBridge));
    let err = compiler.compile_str("x = 1", "<module>").unwrap_err();
    assert!(matches!(err, CompileError::Bridge(BridgeError::NullResult)));
}

#[test]
fn test_shared_bridge_across_threads() {
    let bridge = Arc::new(EchoBridge::default());
    let compiler = Arc::new(NativeCompiler::new(bridge.clone()));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let compiler = Arc::clone(&compiler);
            thread::spawn(move || {
                compiler
                    .compile_str("x = 1", &format!("<thread-{}>", i))
                    .unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let kyc = handle.join().unwrap();
        assert_eq!(kyc.code.filename, format!("<thread-{}>", i));
    }
    assert_eq!(bridge.calls.load(Ordering::SeqCst), 4);
}

#[test]
fn test_boxed_compiler() {
    let compiler: Box<dyn Compiler> = Box::new(NativeCompiler::new(Arc::new(EchoBridge::default())));
    assert_eq!(compiler.name(), "native");
    assert!(compiler.compile_raw("x = 1", "<module>").unwrap().starts_with(b"KYCA"));
}

#[test]
fn test_top_level_helpers_report_load_failure() {
    let mut config = CompilerConfig::default();
    config.bridge.library = Some(PathBuf::from("/nonexistent/libkython_bridge.so"));

    let err = compile_source("x = 1", "<module>", &config).unwrap_err();
    assert!(format!("{:#}", err).contains("native library not found"));

    let config = CompilerConfig {
        backend: Backend::Subprocess,
        ..Default::default()
    };
    let err = compile_file(std::path::Path::new("app.py"), &config).unwrap_err();
    assert!(format!("{:#}", err).contains("kyc script not configured"));
}
