//! Marker vocabulary for SPIR-V skip annotations in Zig behavior tests.
//!
//! A test is "expected to fail" while its body carries the skip statement
//! below. Markers inserted by this tool carry a trailing tag so they can be
//! told apart from markers written by hand.

/// The skip statement recognized as an eligibility marker.
pub const MARKER_TEXT: &str =
    "if (builtin.zig_backend == .stage2_spirv64) return error.SkipZigTest;";

/// Structural prefix shared by the marker and its older spellings.
pub const MARKER_PREFIX: &str = "if (builtin.zig_backend == .stage2_spirv";

/// Trailing tag appended to markers the tool inserts itself.
pub const GENERATED_TAG: &str = " // generated";

/// Tokens on a marker line that exclude the case from execution for good.
pub const FLAKY_TOKENS: [&str; 2] = ["flaky", "function pointers"];

const MARKER_INDENT: &str = "    ";

/// Whether `line` opens a new test case.
pub fn is_declaration(line: &str) -> bool {
    line.strip_prefix("test")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|ch| ch.is_whitespace() || ch == '"' || ch == '{')
}

pub fn is_marker(line: &str) -> bool {
    line.contains(MARKER_TEXT)
}

/// Statement a candidate must end in to be a single-line skip.
const SKIP_STATEMENT: &str = "return error.SkipZigTest;";

/// A near-miss marker: same structural prefix, different wording, and the
/// whole guard on one line. Block guards opening with `{` never qualify.
pub fn is_candidate(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with(MARKER_PREFIX)
        && trimmed.contains(SKIP_STATEMENT)
        && !trimmed.ends_with('{')
        && !is_marker(line)
}

/// Any line that is neither blank nor a comment.
pub fn is_statement(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with("//")
}

pub fn is_generated(line: &str) -> bool {
    line.contains(GENERATED_TAG)
}

pub fn is_flaky(line: &str) -> bool {
    FLAKY_TOKENS.iter().any(|token| line.contains(token))
}

/// Render a freshly generated marker line using the given indentation.
pub fn generated_marker(indent: &str) -> String {
    format!("{indent}{MARKER_TEXT}{GENERATED_TAG}\n")
}

pub fn default_generated_marker() -> String {
    generated_marker(MARKER_INDENT)
}

/// Rewrite a generated marker so it carries the tag exactly once.
pub fn single_generated_tag(line: &str) -> String {
    let (body, newline) = match line.strip_suffix('\n') {
        Some(body) => (body, "\n"),
        None => (line, ""),
    };
    let untagged = body.replace(GENERATED_TAG, "");
    format!("{}{GENERATED_TAG}{newline}", untagged.trim_end())
}

/// Leading whitespace of `line`.
pub fn indentation(line: &str) -> &str {
    let trimmed = line.trim_start();
    &line[..line.len() - trimmed.len()]
}
