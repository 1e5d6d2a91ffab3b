//! Invocation of external archiving programs.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

/// A single blocking run of an external program.
///
/// The program is looked up on `PATH` when [`run()`](Self::run) is called,
/// never earlier: a missing binary is only an error for the operation that
/// needs it.
pub(crate) struct Invocation {
    program: String,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    tolerated: Vec<i32>,
}

impl Invocation {
    pub(crate) fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            tolerated: Vec::new(),
        }
    }

    pub(crate) fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub(crate) fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub(crate) fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Treat a non-zero exit `code` as success (e.g. "completed with warnings").
    pub(crate) fn tolerate(mut self, code: i32) -> Self {
        self.tolerated.push(code);
        self
    }

    pub(crate) fn run(self) -> Result<Output> {
        let binary = which::which(&self.program).or_raise(|| ErrorKind::ToolNotFound(self.program.clone()))?;
        let mut command = Command::new(&binary);
        command.args(&self.args).stdin(Stdio::null());
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }
        tracing::debug!(program = %binary.display(), args = ?self.args, cwd = ?self.cwd, "Running external tool");
        let output = command.output().or_raise(|| ErrorKind::Io)?;
        match output.status.code() {
            Some(0) => Ok(output),
            Some(code) if self.tolerated.contains(&code) => {
                tracing::warn!(
                    program = %self.program,
                    code,
                    diagnostic = %diagnostic(&output),
                    "External tool finished with warnings"
                );
                Ok(output)
            },
            code => exn::bail!(ErrorKind::ToolFailed {
                program: self.program,
                code,
                diagnostic: diagnostic(&output),
            }),
        }
    }
}

/// The tool's own explanation of what happened: stderr if it wrote anything,
/// otherwise stdout (some archivers report errors there).
fn diagnostic(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let text = match stderr.trim() {
        "" => String::from_utf8_lossy(&output.stdout).trim().to_string(),
        trimmed => trimmed.to_string(),
    };
    if text.is_empty() { "no diagnostic output".to_string() } else { text }
}
