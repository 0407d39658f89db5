//! Execution of a single test case against the external compiler.
//!
//! Each case is written to its own temporary directory, compiled and run by
//! the Zig compiler using the SPIR-V test executor as the test command, and
//! bounded by a wall-clock timeout. Stderr goes to a file in the same
//! directory so a chatty child can never block on a full pipe.
use crate::classify::{classify, TIMEOUT_LABEL};
use crate::schedule::Job;
use crate::util::tail_string;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);
const TEST_FILE_NAME: &str = "test.zig";
const STDERR_FILE_NAME: &str = "stderr.log";
const MAX_LOGGED_STDERR_BYTES: usize = 2048;

/// Backend API profile selecting target triple and CPU features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Api {
    Opencl,
    Vulkan,
}

impl Api {
    pub fn as_str(&self) -> &'static str {
        match self {
            Api::Opencl => "opencl",
            Api::Vulkan => "vulkan",
        }
    }

    pub fn target(&self) -> String {
        format!("spirv64-{}-gnu", self.as_str())
    }

    pub fn cpu_features(&self) -> &'static str {
        match self {
            Api::Opencl => "generic+Int64+Int16+Int8+Float16+Float64",
            Api::Vulkan => "vulkan_v1_2+Int64+Int16+Int8+Float16+Float64",
        }
    }
}

/// Fixed per-run invocation settings.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub compiler: PathBuf,
    pub test_runner: PathBuf,
    pub test_executor: PathBuf,
    pub api: Api,
    pub platform: Option<String>,
    pub device: Option<String>,
    pub timeout: Duration,
}

/// Raw result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Exited { code: Option<i32>, stderr: String },
    TimedOut,
}

/// Normalized result of one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    Fail(String),
}

impl Outcome {
    pub fn from_result(result: ExecutionResult) -> Self {
        match result {
            ExecutionResult::TimedOut => Outcome::Fail(TIMEOUT_LABEL.to_string()),
            ExecutionResult::Exited { code: Some(0), .. } => Outcome::Pass,
            ExecutionResult::Exited { stderr, .. } => Outcome::Fail(classify(&stderr)),
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Pass)
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Outcome::Pass => None,
            Outcome::Fail(label) => Some(label.as_str()),
        }
    }
}

impl ExecutorConfig {
    /// Arguments passed to the compiler for the given test file.
    pub fn args(&self, test_file: &Path) -> Vec<String> {
        let mut args = vec![
            "test".to_string(),
            test_file.display().to_string(),
            "--test-runner".to_string(),
            self.test_runner.display().to_string(),
            "-fno-compiler-rt".to_string(),
            "-target".to_string(),
            self.api.target(),
            "-mcpu".to_string(),
            self.api.cpu_features().to_string(),
            "-fno-llvm".to_string(),
            "--test-cmd".to_string(),
            self.test_executor.display().to_string(),
            "--test-cmd-bin".to_string(),
        ];
        if let Some(platform) = &self.platform {
            args.push("-p".to_string());
            args.push(platform.clone());
        }
        if let Some(device) = &self.device {
            args.push("-d".to_string());
            args.push(device.clone());
        }
        args
    }

    /// Run one job and reduce the result to an outcome.
    ///
    /// Failures to set up or spawn the process become failed outcomes so
    /// that one broken case never takes down its siblings.
    pub fn run_job(&self, job: &Job) -> Outcome {
        match self.execute(&job.source) {
            Ok(result) => Outcome::from_result(result),
            Err(err) => {
                tracing::warn!(name = %job.name, error = %format!("{err:#}"), "execution failed");
                Outcome::Fail(format!("spawn failed: {err}"))
            }
        }
    }

    /// Materialize `source` in a fresh temp dir and invoke the compiler.
    pub fn execute(&self, source: &str) -> Result<ExecutionResult> {
        let dir = tempfile::Builder::new()
            .prefix("spirv-triage-")
            .tempdir()
            .context("create temp dir")?;
        let test_path = dir.path().join(TEST_FILE_NAME);
        fs::write(&test_path, source)
            .with_context(|| format!("write {}", test_path.display()))?;
        let stderr_path = dir.path().join(STDERR_FILE_NAME);
        let stderr_file = File::create(&stderr_path)
            .with_context(|| format!("create {}", stderr_path.display()))?;

        let args = self.args(&test_path);
        tracing::debug!(command = %shell_words::join(
            std::iter::once(self.compiler.display().to_string()).chain(args.iter().cloned())
        ), "spawn");

        let mut cmd = Command::new(&self.compiler);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr_file))
            .current_dir(dir.path());
        detach_from_terminal_group(&mut cmd);

        let start = Instant::now();
        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawn {}", self.compiler.display()))?;
        let code = match wait_with_timeout(&mut child, self.timeout)? {
            Some(code) => code,
            None => {
                tracing::debug!(elapsed_ms = start.elapsed().as_millis(), "timed out");
                return Ok(ExecutionResult::TimedOut);
            }
        };
        tracing::debug!(elapsed_ms = start.elapsed().as_millis(), ?code, "exited");

        let stderr = fs::read(&stderr_path)
            .with_context(|| format!("read {}", stderr_path.display()))?;
        let stderr = String::from_utf8_lossy(&stderr).into_owned();
        if code != Some(0) {
            tracing::trace!(stderr = tail_string(&stderr, MAX_LOGGED_STDERR_BYTES), "stderr tail");
        }
        Ok(ExecutionResult::Exited { code, stderr })
    }
}

/// Wait for `child`, killing it once `timeout` elapses.
///
/// Returns `None` on timeout, otherwise the exit code (`Some(None)` when the
/// child died from a signal).
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Option<Option<i32>>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait().context("check child status")? {
            return Ok(Some(status.code()));
        }
        if start.elapsed() >= timeout {
            kill_process_group(child);
            let _ = child.kill();
            child.wait().context("reap timed out child")?;
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Keep terminal interrupts away from in-flight children so they can finish.
#[cfg(unix)]
fn detach_from_terminal_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn detach_from_terminal_group(_cmd: &mut Command) {}

/// Kill the child together with anything it spawned (the test executor).
#[cfg(unix)]
fn kill_process_group(child: &Child) {
    if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: killpg only sends a signal; the group was created at spawn.
        unsafe {
            libc::killpg(pgid, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
