//! CLI argument parsing for the skip-marker triage workflow.
//!
//! The CLI is thin: it only collects paths and switches, and `config` turns
//! them into a validated run configuration.
use crate::exec::Api;
use clap::Parser;
use std::path::PathBuf;

/// Default per-case timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "spirv-triage",
    version,
    about = "Promote and demote SPIR-V skip markers in Zig behavior tests",
    after_help = "Examples:\n  spirv-triage zig ../zig/test/behavior\n  spirv-triage zig ../zig/test/behavior/vector.zig --recheck\n  spirv-triage zig ../zig/test/behavior --list\n  spirv-triage zig ../zig/test/behavior --api vulkan -p rusticl -d llvmpipe"
)]
pub struct RunArgs {
    /// Path to the Zig compiler
    #[arg(value_name = "COMPILER")]
    pub compiler: PathBuf,

    /// Test file or directory of test files to update
    #[arg(value_name = "PATH")]
    pub target: PathBuf,

    /// Repository root used to locate the test runner and executor
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Test runner source (default: <root>/src/test_runner.zig)
    #[arg(long, value_name = "PATH")]
    pub test_runner: Option<PathBuf>,

    /// SPIR-V test executor (default: <root>/zig-out/bin/zig-spirv-test-executor)
    #[arg(long, value_name = "PATH")]
    pub test_executor: Option<PathBuf>,

    /// Backend API profile
    #[arg(long, value_enum, default_value_t = Api::Opencl)]
    pub api: Api,

    /// Platform passed to the test executor
    #[arg(short, long, value_name = "NAME")]
    pub platform: Option<String>,

    /// Device passed to the test executor
    #[arg(short, long, value_name = "NAME")]
    pub device: Option<String>,

    /// Per-case timeout in seconds
    #[arg(
        long,
        value_name = "SECONDS",
        env = "SPIRV_TRIAGE_TIMEOUT",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub timeout: f64,

    /// Number of parallel workers (default: host parallelism)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Also re-run cases whose marker was generated by a previous run
    #[arg(long)]
    pub recheck: bool,

    /// Only list executable case counts per file; run nothing
    #[arg(long)]
    pub list: bool,

    /// Only execute cases whose name contains this text
    #[arg(long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Write a JSON report of the run
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Emit debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
