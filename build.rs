//! Builds the stand-in `kython_bridge` used by the integration tests.
//!
//! The library is only needed by `tests/`; if no C toolchain is available
//! the build carries on and those tests skip themselves.

use std::env;
use std::path::PathBuf;

const STUB_SOURCE: &str = "tests/native/bridge_stub.c";

fn main() {
    println!("cargo:rerun-if-changed={}", STUB_SOURCE);
    println!("cargo:rerun-if-changed=build.rs");

    if env::var("CARGO_CFG_TARGET_FAMILY").as_deref() != Ok("unix") {
        return;
    }

    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => return,
    };
    let suffix = if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("macos") {
        "dylib"
    } else {
        "so"
    };
    let library = out_dir.join(format!("libkython_bridge_stub.{}", suffix));

    let compiler = match cc::Build::new().opt_level(0).cargo_metadata(false).try_get_compiler() {
        Ok(compiler) => compiler,
        Err(e) => {
            println!("cargo:warning=bridge stub skipped: {}", e);
            return;
        }
    };

    let status = compiler
        .to_command()
        .arg("-shared")
        .arg("-fPIC")
        .arg("-o")
        .arg(&library)
        .arg(STUB_SOURCE)
        .status();

    match status {
        Ok(status) if status.success() => {
            println!("cargo:rustc-env=KYTHON_BRIDGE_STUB={}", library.display());
        }
        Ok(status) => println!("cargo:warning=bridge stub failed to build ({})", status),
        Err(e) => println!("cargo:warning=bridge stub skipped: {}", e),
    }
}
