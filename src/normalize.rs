//! Marker normalization for annotated test files.
//!
//! Every test case must carry exactly one skip marker. Cases without one get
//! a generated marker: either in place of a near-miss spelling found in the
//! case prologue, or directly after the declaration followed by a blank line.
//! Edits are planned against the original lines and applied in one pass.
use crate::marker::{
    default_generated_marker, generated_marker, indentation, is_candidate, is_declaration,
    is_marker, is_statement,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edit {
    /// Insert a marker and a blank separator after the declaration.
    InsertAfter,
    /// Rewrite a near-miss marker line in place.
    Replace,
}

#[derive(Debug, Default)]
struct CaseScan {
    decl: usize,
    seen_marker: bool,
    seen_other: bool,
    candidate: Option<usize>,
}

impl CaseScan {
    fn new(decl: usize) -> Self {
        Self {
            decl,
            ..Self::default()
        }
    }

    fn observe(&mut self, idx: usize, line: &str) {
        if is_marker(line) {
            self.seen_marker = true;
        } else if is_candidate(line) {
            if !self.seen_other {
                self.candidate = Some(idx);
            }
        } else if is_statement(line) {
            self.seen_other = true;
        }
    }

    fn finish(self, edits: &mut BTreeMap<usize, Edit>) {
        if self.seen_marker {
            return;
        }
        match self.candidate {
            Some(idx) => edits.insert(idx, Edit::Replace),
            None => edits.insert(self.decl, Edit::InsertAfter),
        };
    }
}

fn plan_edits(lines: &[String]) -> BTreeMap<usize, Edit> {
    let mut edits = BTreeMap::new();
    let mut current: Option<CaseScan> = None;
    for (idx, line) in lines.iter().enumerate() {
        if is_declaration(line) {
            if let Some(scan) = current.take() {
                scan.finish(&mut edits);
            }
            current = Some(CaseScan::new(idx));
            continue;
        }
        if let Some(scan) = current.as_mut() {
            scan.observe(idx, line);
        }
    }
    if let Some(scan) = current {
        scan.finish(&mut edits);
    }
    edits
}

/// Return `lines` with a marker guaranteed for every test case.
///
/// Already-normalized input comes back unchanged.
pub fn normalize_lines(lines: &[String]) -> Vec<String> {
    let edits = plan_edits(lines);
    if edits.is_empty() {
        return lines.to_vec();
    }
    let mut out = Vec::with_capacity(lines.len() + edits.len() * 2);
    for (idx, line) in lines.iter().enumerate() {
        match edits.get(&idx) {
            None => out.push(line.clone()),
            Some(Edit::Replace) => out.push(generated_marker(indentation(line))),
            Some(Edit::InsertAfter) => {
                let mut decl = line.clone();
                if !decl.ends_with('\n') {
                    decl.push('\n');
                }
                out.push(decl);
                out.push(default_generated_marker());
                out.push("\n".to_string());
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
