//! Test-case extraction from normalized files.
use crate::corpus::AnnotatedFile;
use crate::marker::{is_declaration, is_flaky, is_generated, is_marker};
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// Name used when a declaration carries no parsable title.
pub const UNKNOWN_NAME: &str = "unknown";

/// Structural defects in the corpus. These indicate a normalizer bug.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("{}:{line}: test case has no skip marker after normalization", path.display())]
    MissingMarker { path: PathBuf, line: usize },
}

/// Identity of a case: owning file index and declaration line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaseId {
    pub file: usize,
    pub decl_line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub id: CaseId,
    pub name: String,
    pub marker_line: usize,
    pub flaky: bool,
    pub generated: bool,
    pub execute: bool,
}

/// Whether a case runs this time, given its marker flags.
pub fn should_execute(flaky: bool, generated: bool, recheck: bool) -> bool {
    if flaky {
        return false;
    }
    !generated || recheck
}

fn title_regex() -> &'static Regex {
    static TITLE: OnceLock<Regex> = OnceLock::new();
    TITLE.get_or_init(|| Regex::new(r#"^test\s+"((?:[^"\\]|\\.)*)""#).expect("valid title regex"))
}

/// Extract the quoted title of a declaration, falling back to `unknown`.
pub fn parse_name(decl: &str) -> String {
    title_regex()
        .captures(decl)
        .and_then(|caps| caps.get(1))
        .map(|title| title.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

/// Enumerate the cases of a normalized file in declaration order.
pub fn extract_cases(
    file_index: usize,
    file: &AnnotatedFile,
    recheck: bool,
) -> Result<Vec<TestCase>, CorpusError> {
    let lines = file.lines();
    let mut cases = Vec::new();
    for (decl_line, decl) in lines.iter().enumerate() {
        if !is_declaration(decl) {
            continue;
        }
        let marker_line = lines[decl_line + 1..]
            .iter()
            .position(|line| is_declaration(line) || is_marker(line))
            .map(|offset| decl_line + 1 + offset)
            .filter(|&idx| is_marker(&lines[idx]))
            .ok_or_else(|| CorpusError::MissingMarker {
                path: file.path.clone(),
                line: decl_line + 1,
            })?;
        let marker = &lines[marker_line];
        let flaky = is_flaky(marker);
        let generated = is_generated(marker);
        cases.push(TestCase {
            id: CaseId {
                file: file_index,
                decl_line,
            },
            name: parse_name(decl),
            marker_line,
            flaky,
            generated,
            execute: should_execute(flaky, generated, recheck),
        });
    }
    Ok(cases)
}
