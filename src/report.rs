//! Console and JSON reporting.
use crate::exec::{Api, Outcome};
use crate::util::display_path;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// One progress line, printed as soon as a case reports.
pub fn progress_line(position: usize, total: usize, name: &str, outcome: &Outcome) -> String {
    match outcome {
        Outcome::Pass => format!("[{position}/{total}] PASS {name}"),
        Outcome::Fail(label) => format!("[{position}/{total}] FAIL {name} ({label})"),
    }
}

/// Pass/fail counts of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub scheduled: usize,
    pub passed: usize,
    pub failed: usize,
}

impl Tally {
    pub fn record(&mut self, outcome: &Outcome) {
        if outcome.is_pass() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn completed(&self) -> usize {
        self.passed + self.failed
    }

    pub fn summary_line(&self) -> String {
        if self.scheduled == 0 {
            return "no tests to execute".to_string();
        }
        let completed = self.completed();
        if completed == 0 {
            return format!("no tests completed (0/{} scheduled)", self.scheduled);
        }
        let percent = self.passed as f64 * 100.0 / completed as f64;
        let mut line = format!("passed {}/{} ({percent:.1}%)", self.passed, completed);
        if completed < self.scheduled {
            line.push_str(&format!(", {} not run", self.scheduled - completed));
        }
        line
    }
}

/// List-mode lines: files by ascending executable count, then a total.
pub fn list_lines(counts: &[(PathBuf, usize)], base: Option<&Path>) -> Vec<String> {
    let mut sorted: Vec<_> = counts.iter().collect();
    sorted.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    let width = counts
        .iter()
        .map(|(_, count)| count.to_string().len())
        .max()
        .unwrap_or(1);
    let mut lines: Vec<String> = sorted
        .into_iter()
        .map(|(path, count)| format!("{count:>width$} {}", display_path(path, base)))
        .collect();
    let total: usize = counts.iter().map(|(_, count)| count).sum();
    lines.push(format!("total {total}"));
    lines
}

#[derive(Debug, Serialize)]
pub struct CaseReport {
    pub file: String,
    pub line: usize,
    pub name: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Machine-readable record of a run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub schema_version: u32,
    pub api: Api,
    pub recheck: bool,
    pub interrupted: bool,
    pub tally: Tally,
    pub markers_removed: usize,
    pub files_written: Vec<String>,
    pub cases: Vec<CaseReport>,
}

pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let bytes = serde_json::to_vec_pretty(report).context("serialize run report")?;
    fs::write(path, bytes).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_lines() {
        assert_eq!(progress_line(1, 4, "add", &Outcome::Pass), "[1/4] PASS add");
        assert_eq!(
            progress_line(2, 4, "mul", &Outcome::Fail("panic".to_string())),
            "[2/4] FAIL mul (panic)"
        );
    }

    #[test]
    fn empty_run_is_reported_distinctly() {
        assert_eq!(Tally::default().summary_line(), "no tests to execute");
    }

    #[test]
    fn tally_summary() {
        let mut tally = Tally {
            scheduled: 4,
            ..Tally::default()
        };
        tally.record(&Outcome::Pass);
        tally.record(&Outcome::Fail("unknown".to_string()));
        tally.record(&Outcome::Pass);
        assert_eq!(tally.summary_line(), "passed 2/3 (66.7%), 1 not run");
        tally.record(&Outcome::Pass);
        assert_eq!(tally.summary_line(), "passed 3/4 (75.0%)");
    }

    #[test]
    fn list_is_sorted_ascending_with_total() {
        let counts = vec![
            (PathBuf::from("/t/b.zig"), 3),
            (PathBuf::from("/t/a.zig"), 12),
            (PathBuf::from("/t/c.zig"), 0),
        ];
        assert_eq!(
            list_lines(&counts, Some(Path::new("/t"))),
            vec![" 0 c.zig", " 3 b.zig", "12 a.zig", "total 15"]
        );
    }

    #[test]
    fn report_serializes_without_empty_labels() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("out/report.json");
        let report = RunReport {
            schema_version: REPORT_SCHEMA_VERSION,
            api: Api::Vulkan,
            recheck: false,
            interrupted: false,
            tally: Tally {
                scheduled: 1,
                passed: 1,
                failed: 0,
            },
            markers_removed: 1,
            files_written: vec!["a.zig".to_string()],
            cases: vec![CaseReport {
                file: "a.zig".to_string(),
                line: 3,
                name: "add".to_string(),
                passed: true,
                label: None,
            }],
        };
        write_report(&path, &report).expect("write report");
        let value: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).expect("read report")).expect("parse report");
        assert_eq!(value["api"], "vulkan");
        assert_eq!(value["tally"]["passed"], 1);
        assert!(value["cases"][0].get("label").is_none());
    }
}
