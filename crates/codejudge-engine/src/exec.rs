//! Sandboxed compile-and-run execution.
//!
//! Used by the surrounding orchestration to diff program outputs; the
//! comparison core itself never executes anything. Each invocation owns a
//! scratch directory that the guard removes on every exit path, including
//! timeouts. The child process is spawned with `kill_on_drop`, so a run
//! abandoned by the timeout is reaped rather than leaked.

use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use codejudge_ast::Language;

use crate::error::EngineError;

/// Cap on captured stdout/stderr bytes.
const OUTPUT_CAP: usize = 10 * 1024 * 1024;

/// Outcome of one sandboxed run.
#[derive(Debug, Clone, Serialize)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub wall_time_seconds: f64,
}

/// Compiles `code` with the system toolchain and runs it on `stdin`.
///
/// A compile failure is reported as a result with the compiler's stderr
/// and exit code, not an error; only infrastructure failures and the
/// deadline produce `Err`.
pub async fn run_program(
    language: Language,
    code: &str,
    stdin: Option<&str>,
    timeout: Duration,
) -> Result<ExecResult, EngineError> {
    let scratch = tempfile::tempdir()?;
    let (file_name, compiler) = match language {
        Language::C => ("prog.c", "gcc"),
        Language::Cpp => ("prog.cpp", "g++"),
    };
    let source_path = scratch.path().join(file_name);
    tokio::fs::write(&source_path, code).await?;
    let binary_path = scratch.path().join("prog");

    let compile = Command::new(compiler)
        .arg(&source_path)
        .arg("-O0")
        .arg("-o")
        .arg(&binary_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output();
    let compile = tokio::time::timeout(timeout, compile)
        .await
        .map_err(|_| EngineError::ExecTimeout(timeout))?
        .map_err(EngineError::Io)?;
    if !compile.status.success() {
        return Ok(ExecResult {
            stdout: String::new(),
            stderr: truncated(&compile.stderr),
            exit_code: compile.status.code().unwrap_or(-1),
            wall_time_seconds: 0.0,
        });
    }

    let start = Instant::now();
    let mut child = Command::new(&binary_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;
    if let Some(input) = stdin {
        if let Some(mut handle) = child.stdin.take() {
            handle.write_all(input.as_bytes()).await?;
        }
    }
    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| EngineError::ExecTimeout(timeout))?
        .map_err(EngineError::Io)?;

    Ok(ExecResult {
        stdout: truncated(&output.stdout),
        stderr: truncated(&output.stderr),
        exit_code: output.status.code().unwrap_or(-1),
        wall_time_seconds: start.elapsed().as_secs_f64(),
    })
}

fn truncated(bytes: &[u8]) -> String {
    let slice = if bytes.len() > OUTPUT_CAP {
        &bytes[..OUTPUT_CAP]
    } else {
        bytes
    };
    String::from_utf8_lossy(slice).into_owned()
}
