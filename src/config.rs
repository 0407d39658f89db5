//! Run configuration assembled from CLI arguments.
//!
//! Defaults for the runner and executor are resolved against `--root`, and
//! the compiler is looked up on `PATH` when given as a bare name.
use crate::cli::RunArgs;
use crate::exec::ExecutorConfig;
use crate::pool::default_workers;
use anyhow::{anyhow, Result};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const TEST_RUNNER_REL: &str = "src/test_runner.zig";
const TEST_EXECUTOR_REL: &str = "zig-out/bin/zig-spirv-test-executor";

/// Everything a run needs, validated up front.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target: PathBuf,
    pub executor: ExecutorConfig,
    pub workers: NonZeroUsize,
    pub recheck: bool,
    pub list_only: bool,
    pub filter: Option<String>,
    pub report: Option<PathBuf>,
}

impl RunConfig {
    pub fn from_args(args: RunArgs) -> Result<Self> {
        let timeout = validate_timeout(args.timeout)?;
        let workers = match args.jobs {
            Some(jobs) => {
                NonZeroUsize::new(jobs).ok_or_else(|| anyhow!("--jobs must be at least 1"))?
            }
            None => default_workers(),
        };
        let test_runner = args
            .test_runner
            .unwrap_or_else(|| args.root.join(TEST_RUNNER_REL));
        let test_executor = args
            .test_executor
            .unwrap_or_else(|| args.root.join(TEST_EXECUTOR_REL));
        let compiler = if args.list {
            args.compiler
        } else {
            resolve_compiler(&args.compiler)?
        };
        let filter = args
            .filter
            .map(|filter| filter.trim().to_string())
            .filter(|filter| !filter.is_empty());

        Ok(Self {
            target: args.target,
            executor: ExecutorConfig {
                compiler,
                test_runner,
                test_executor,
                api: args.api,
                platform: args.platform,
                device: args.device,
                timeout,
            },
            workers,
            recheck: args.recheck,
            list_only: args.list,
            filter,
            report: args.report,
        })
    }
}

fn validate_timeout(timeout: f64) -> Result<Duration> {
    if !timeout.is_finite() || timeout <= 0.0 {
        return Err(anyhow!("--timeout must be a positive number of seconds"));
    }
    Duration::try_from_secs_f64(timeout)
        .map_err(|err| anyhow!("--timeout must be a positive number of seconds: {err}"))
}

/// Resolve a bare compiler name via `PATH`; explicit paths must exist.
fn resolve_compiler(compiler: &Path) -> Result<PathBuf> {
    if compiler.components().count() > 1 || compiler.is_absolute() {
        if compiler.is_file() {
            return Ok(compiler.to_path_buf());
        }
        return Err(anyhow!("compiler {} not found", compiler.display()));
    }
    which::which(compiler).map_err(|err| anyhow!("compiler {} not found: {err}", compiler.display()))
}
