//! Shared test infrastructure for integration tests.
//!
//! Each fixture owns a temp directory holding a fake `zig` script and a small
//! corpus of test files, and runs the real `spirv-triage` binary against it.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const MARKER: &str = "if (builtin.zig_backend == .stage2_spirv64) return error.SkipZigTest;";

/// Fake compiler: passes sources mentioning `PASS_ME`, hangs on `HANG_ME`,
/// and otherwise fails with an AIR tag diagnostic.
const FAKE_COMPILER: &str = r#"#!/bin/sh
if [ "$1" != "test" ]; then
    echo "unexpected subcommand $1" >&2
    exit 2
fi
if grep -q PASS_ME "$2"; then
    exit 0
fi
if grep -q HANG_ME "$2"; then
    sleep 30
fi
echo 'error: TODO (SPIR-V): implement AIR tag mul_add' >&2
exit 1
"#;

pub struct Fixture {
    pub dir: TempDir,
}

/// Result of one binary invocation.
#[derive(Debug)]
pub struct RunResult {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl From<Output> for RunResult {
    fn from(output: Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create fixture dir");
        fs::create_dir_all(dir.path().join("behavior")).expect("create corpus dir");
        let compiler = dir.path().join("zig");
        fs::write(&compiler, FAKE_COMPILER).expect("write fake compiler");
        let mut perms = fs::metadata(&compiler)
            .expect("stat fake compiler")
            .permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&compiler, perms).expect("chmod fake compiler");
        Self { dir }
    }

    pub fn compiler(&self) -> PathBuf {
        self.dir.path().join("zig")
    }

    pub fn corpus(&self) -> PathBuf {
        self.dir.path().join("behavior")
    }

    pub fn write_test(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.corpus().join(name);
        fs::write(&path, contents).expect("write test file");
        path
    }

    pub fn read(&self, path: &Path) -> String {
        fs::read_to_string(path).expect("read test file")
    }

    /// Run the binary on the whole corpus with extra arguments.
    pub fn run(&self, extra: &[&str]) -> RunResult {
        let output = Command::new(env!("CARGO_BIN_EXE_spirv-triage"))
            .arg(self.compiler())
            .arg(self.corpus())
            .arg("--root")
            .arg(self.dir.path())
            .args(extra)
            .env_remove("RUST_LOG")
            .env_remove("SPIRV_TRIAGE_TIMEOUT")
            .output()
            .expect("run spirv-triage");
        output.into()
    }
}

/// A test case guarded by a hand-written marker.
pub fn human_case(name: &str, body: &str) -> String {
    format!("test \"{name}\" {{\n    {MARKER}\n    {body}\n}}\n")
}
