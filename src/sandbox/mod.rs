//! JavaScript sandbox for practice labs.
//!
//! Every run happens in a fresh child process (the server binary started in
//! worker mode) holding a fresh `boa_engine` context. The only global the
//! host adds is `console`; the engine itself ships no network, filesystem,
//! storage or timer APIs, and the child starts with an empty environment.
//!
//! A run ends at the first of: the script finishing, the engine's
//! loop-iteration or recursion limit, or the wall-clock timeout. On timeout
//! the child is killed and reaped before `execute` returns, so no work
//! outlives its run. Memory inside the child is not capped beyond what it can
//! allocate before the timeout.

mod compare;
mod console;
mod engine;
mod worker;

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use regex::Regex;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};

pub use compare::{compare_output, normalize_output};
pub use engine::{EngineLimits, ScriptReport};
pub use worker::{WORKER_ARG, run_worker};

use engine::as_millis;

static NOT_DEFINED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+) is not defined$").expect("valid regex"));

/// Resource limits applied to every run.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Wall-clock budget for a single run.
    pub timeout: Duration,
    /// Maximum iterations of any single loop before the engine aborts.
    pub loop_iteration_limit: u64,
    /// Maximum call depth before the engine aborts.
    pub recursion_limit: usize,
    /// Scripts larger than this are rejected without being evaluated.
    pub max_code_bytes: usize,
    /// Console output beyond this many characters is dropped.
    pub max_output_chars: usize,
}

impl SandboxConfig {
    pub fn engine_limits(&self) -> EngineLimits {
        EngineLimits {
            loop_iteration_limit: self.loop_iteration_limit,
            recursion_limit: self.recursion_limit,
            max_output_chars: self.max_output_chars,
        }
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(3_000),
            loop_iteration_limit: 1_000_000,
            recursion_limit: 512,
            max_code_bytes: 64 * 1024,
            max_output_chars: 1024 * 1024,
        }
    }
}

/// Outcome of one sandbox run. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub success: bool,
    /// Captured console lines joined with `\n`.
    pub output: String,
    pub error: Option<String>,
    pub execution_time_ms: f64,
}

impl ExecutionResult {
    fn failed(error: String, elapsed: Duration) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error),
            execution_time_ms: as_millis(elapsed),
        }
    }
}

impl From<ScriptReport> for ExecutionResult {
    fn from(report: ScriptReport) -> Self {
        Self {
            success: report.error.is_none(),
            output: report.lines.join("\n"),
            error: report.error,
            execution_time_ms: report.elapsed_ms,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sandbox {
    config: SandboxConfig,
    /// Binary that understands [`WORKER_ARG`].
    program: PathBuf,
}

impl Sandbox {
    pub fn new(config: SandboxConfig, program: impl Into<PathBuf>) -> Self {
        Self {
            config,
            program: program.into(),
        }
    }

    /// Uses the running executable as the worker program.
    pub fn current_exe(config: SandboxConfig) -> io::Result<Self> {
        Ok(Self::new(config, std::env::current_exe()?))
    }

    /// Executes `code` and reports captured output.
    ///
    /// This never panics and never returns an error: faults raised by the
    /// script, engine limits, timeouts and worker crashes all come back as an
    /// `ExecutionResult` with `success == false`.
    pub async fn execute(&self, code: &str) -> ExecutionResult {
        let started = Instant::now();

        if code.len() > self.config.max_code_bytes {
            return ExecutionResult::failed(
                format!(
                    "Code is too large ({} bytes, limit is {} bytes).",
                    code.len(),
                    self.config.max_code_bytes
                ),
                started.elapsed(),
            );
        }

        let spawned = Command::new(&self.program)
            .args(worker::worker_args(&self.config.engine_limits()))
            .env_clear()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            // Covers the caller dropping this future mid-run.
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                tracing::error!("Failed to spawn sandbox worker {:?}: {}", self.program, e);
                return ExecutionResult::failed(
                    "The sandbox could not start. Please try again.".to_string(),
                    started.elapsed(),
                );
            }
        };

        let exchanged = tokio::time::timeout(
            self.config.timeout,
            exchange(&mut child, code, self.report_limit()),
        )
        .await;

        let result = match exchanged {
            Ok(Ok(report)) => ExecutionResult::from(report),
            Ok(Err(e)) => {
                tracing::error!("Sandbox worker failed: {}", e);
                ExecutionResult::failed(
                    "The sandbox stopped unexpectedly while running your code.".to_string(),
                    started.elapsed(),
                )
            }
            Err(_) => {
                // Kill and reap before answering, so the run holds its slot until it is gone.
                if let Err(e) = child.kill().await {
                    tracing::error!("Failed to kill timed-out sandbox worker: {}", e);
                }
                tracing::warn!(
                    "Sandbox run exceeded {} ms and was killed",
                    self.config.timeout.as_millis()
                );
                ExecutionResult::failed(
                    format!(
                        "Execution timed out after {} ms. Check for infinite loops.",
                        self.config.timeout.as_millis()
                    ),
                    started.elapsed(),
                )
            }
        };

        tracing::debug!(
            success = result.success,
            execution_time_ms = result.execution_time_ms,
            "Sandbox run finished"
        );

        result
    }

    /// Upper bound on the report size. JSON escaping can grow each captured
    /// character to six bytes.
    fn report_limit(&self) -> u64 {
        (self.config.max_output_chars as u64).saturating_mul(6) + 64 * 1024
    }
}

/// Feeds the script to the worker and collects its report.
async fn exchange(child: &mut Child, code: &str, report_limit: u64) -> io::Result<ScriptReport> {
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| io::Error::other("worker stdin is not piped"))?;
    stdin.write_all(code.as_bytes()).await?;
    // Closing stdin marks the end of the script.
    drop(stdin);

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("worker stdout is not piped"))?;
    let mut raw = Vec::new();
    stdout.take(report_limit).read_to_end(&mut raw).await?;

    let status = child.wait().await?;
    if !status.success() {
        return Err(io::Error::other(format!("worker exited with {}", status)));
    }

    serde_json::from_slice(&raw).map_err(io::Error::other)
}

/// Rewrites `<name> is not defined` into a message that tells the student
/// what to fix. Other messages pass through untouched.
pub fn normalize_fault_message(message: &str) -> String {
    match NOT_DEFINED.captures(message.trim()) {
        Some(caps) => {
            let name = &caps[1];
            format!(
                "{name} is not defined. Make sure '{name}' is declared before it is used."
            )
        }
        None => message.to_string(),
    }
}
