//! Apply outcomes back onto annotated files and persist them.
//!
//! A marker is removed only when its case ran and passed. A generated marker
//! whose case failed keeps exactly one tag, so it stays a confirmed failure
//! that only `--recheck` revisits. Everything else is left byte-for-byte as
//! it was.
use crate::cases::{CaseId, TestCase};
use crate::corpus::AnnotatedFile;
use crate::exec::Outcome;
use crate::marker::{single_generated_tag, GENERATED_TAG};
use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// What reconciliation changed across the corpus.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub removed: usize,
    pub retagged: usize,
}

/// Whether a case's marker goes away.
pub fn removes_marker(case: &TestCase, outcome: Option<&Outcome>) -> bool {
    case.execute && !case.flaky && outcome.is_some_and(Outcome::is_pass)
}

/// Rewrite each file's buffer from the outcomes of its cases.
///
/// `cases` is per file in corpus order; cases absent from `outcomes` were
/// not executed (or were abandoned on interrupt) and keep their marker.
pub fn reconcile(
    corpus: &mut [AnnotatedFile],
    cases: &[Vec<TestCase>],
    outcomes: &BTreeMap<CaseId, Outcome>,
) -> ReconcileSummary {
    let mut summary = ReconcileSummary::default();
    for (file, file_cases) in corpus.iter_mut().zip(cases) {
        let lines = file.lines();
        let mut deletions = BTreeSet::new();
        let mut rewrites = BTreeMap::new();
        for case in file_cases {
            let outcome = outcomes.get(&case.id);
            if removes_marker(case, outcome) {
                deletions.insert(case.marker_line);
                deletions.extend(orphaned_blank_lines(lines, case));
                summary.removed += 1;
            } else if case.generated && matches!(outcome, Some(Outcome::Fail(_))) {
                let marker = &lines[case.marker_line];
                if marker.matches(GENERATED_TAG).count() > 1 {
                    rewrites.insert(case.marker_line, single_generated_tag(marker));
                    summary.retagged += 1;
                }
            }
        }
        if deletions.is_empty() && rewrites.is_empty() {
            continue;
        }
        let updated = lines
            .iter()
            .enumerate()
            .filter(|(idx, _)| !deletions.contains(idx))
            .map(|(idx, line)| rewrites.remove(&idx).unwrap_or_else(|| line.clone()))
            .collect();
        file.replace_lines(updated);
    }
    summary
}

/// Blank lines that would sit directly under the declaration once the
/// marker is gone: the blank run before the marker plus one separator after.
fn orphaned_blank_lines(lines: &[String], case: &TestCase) -> Vec<usize> {
    let is_blank = |idx: usize| lines.get(idx).is_some_and(|line| line.trim().is_empty());
    let before = case.id.decl_line + 1..case.marker_line;
    if !before.clone().all(is_blank) {
        return Vec::new();
    }
    let mut orphaned: Vec<usize> = before.collect();
    if is_blank(case.marker_line + 1) {
        orphaned.push(case.marker_line + 1);
    }
    orphaned
}

/// Write every modified file back to disk, returning the paths written.
///
/// Each write goes through a sibling temp file and a rename so a crash never
/// leaves a half-written test file behind. A failing file does not stop the
/// remaining ones from being written.
pub fn persist(corpus: &mut [AnnotatedFile]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    let mut failures = Vec::new();
    for file in corpus.iter_mut().filter(|file| file.is_dirty()) {
        match write_atomic(&file.path, file.text().as_bytes()) {
            Ok(()) => {
                tracing::debug!(path = %file.path.display(), "persisted");
                file.mark_clean();
                written.push(file.path.clone());
            }
            Err(err) => {
                tracing::error!(path = %file.path.display(), error = %format!("{err:#}"), "persist failed");
                failures.push(err);
            }
        }
    }
    let failed = failures.len();
    match failures.into_iter().next() {
        Some(err) => Err(err.context(format!("{failed} file(s) could not be written"))),
        None => Ok(written),
    }
}

fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = dest
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("test");
    let tmp_path = dest
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!(".{file_name}.tmp"));
    fs::write(&tmp_path, bytes).with_context(|| format!("write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, dest).with_context(|| format!("replace {}", dest.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
