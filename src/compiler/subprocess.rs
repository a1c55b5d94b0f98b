//! Compiler backed by an external CPython process
//!
//! Runs `<python> -I -S <kyc script> --code <source>` (or `--path <file>`)
//! and reads the hex artifact from the first line of stdout. Stderr is
//! passed through so Python syntax errors reach the user.

use super::{absolute_existing, CompileError, CompileResult, Compiler};
use crate::kyc::decode_hex;
use crate::util::config::SubprocessConfig;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

pub struct SubprocessCompiler {
    python: String,
    script: PathBuf,
    stage_via_file: bool,
}

impl SubprocessCompiler {
    pub fn new(
        python: impl Into<String>,
        script: impl Into<PathBuf>,
    ) -> Self {
        Self {
            python: python.into(),
            script: script.into(),
            stage_via_file: false,
        }
    }

    pub fn from_config(config: &SubprocessConfig) -> CompileResult<Self> {
        let script = config
            .script
            .clone()
            .ok_or(CompileError::ScriptNotConfigured)?;
        Ok(Self {
            python: config.python.clone(),
            script,
            stage_via_file: config.stage_via_file,
        })
    }

    /// Pass source through a temporary file instead of the command line
    pub fn stage_via_file(
        mut self,
        enabled: bool,
    ) -> Self {
        self.stage_via_file = enabled;
        self
    }

    pub fn python(&self) -> &str {
        &self.python
    }

    fn execute(
        &self,
        args: &[OsString],
    ) -> CompileResult<Vec<u8>> {
        debug!(python = %self.python, script = %self.script.display(), "running kyc script");

        let output = Command::new(&self.python)
            .arg("-I") // isolate cpython from user site and env vars
            .arg("-S") // no site.py
            .arg(&self.script)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .map_err(|source| CompileError::Spawn {
                program: self.python.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CompileError::ProcessFailed {
                program: self.python.clone(),
                status: output.status,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let hex = stdout
            .lines()
            .next()
            .filter(|line| !line.trim().is_empty())
            .ok_or(CompileError::EmptyOutput)?;
        if stdout.lines().nth(1).is_some() {
            warn!("kyc script printed more than one line; using the first");
        }

        Ok(decode_hex(hex)?)
    }

    fn path_args(path: &Path) -> Vec<OsString> {
        vec!["--path".into(), path.as_os_str().to_owned()]
    }
}

impl Compiler for SubprocessCompiler {
    fn name(&self) -> &'static str {
        "subprocess"
    }

    /// The script has no filename flag, so `filename` only shows up in logs.
    fn compile_raw(
        &self,
        code: &str,
        filename: &str,
    ) -> CompileResult<Vec<u8>> {
        debug!(filename, "compiling source string");

        if !self.stage_via_file {
            if let Some(position) = code.find('\0') {
                return Err(CompileError::InteriorNul { position });
            }
            let args: [OsString; 2] = ["--code".into(), code.into()];
            return self.execute(&args);
        }

        let mut staged = tempfile::Builder::new()
            .prefix("kyc-")
            .suffix(".py")
            .tempfile()
            .map_err(CompileError::Staging)?;
        staged
            .write_all(code.as_bytes())
            .and_then(|_| staged.flush())
            .map_err(CompileError::Staging)?;

        self.execute(&Self::path_args(staged.path()))
    }

    fn compile_path_raw(
        &self,
        path: &Path,
    ) -> CompileResult<Vec<u8>> {
        let absolute = absolute_existing(path)?;
        self.execute(&Self::path_args(&absolute))
    }
}
