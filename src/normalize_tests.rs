use super::normalize_lines;
use crate::corpus::split_lines;
use crate::marker::{is_declaration, is_marker, MARKER_TEXT};

fn normalize(text: &str) -> String {
    normalize_lines(&split_lines(text)).concat()
}

fn generated() -> String {
    format!("    {MARKER_TEXT} // generated\n")
}

#[test]
fn file_without_tests_is_unchanged() {
    let text = "const std = @import(\"std\");\n\nfn helper() void {}\n";
    assert_eq!(normalize(text), text);
}

#[test]
fn case_without_marker_gets_marker_and_separator() {
    let text = "test \"add\" {\n    try expect(1 + 1 == 2);\n}\n";
    let expected = format!(
        "test \"add\" {{\n{}\n    try expect(1 + 1 == 2);\n}}\n",
        generated()
    );
    assert_eq!(normalize(text), expected);
}

#[test]
fn declaration_only_case_receives_two_lines() {
    let before = split_lines("test \"empty\" {}");
    let after = normalize_lines(&before);
    assert_eq!(after.len(), before.len() + 2);
    assert_eq!(after[0], "test \"empty\" {}\n");
    assert_eq!(after[1], generated());
    assert_eq!(after[2], "\n");
}

#[test]
fn human_marker_is_left_alone() {
    let text = format!(
        "test \"tracked\" {{\n    {MARKER_TEXT}\n    try expect(true);\n}}\n"
    );
    assert_eq!(normalize(&text), text);
}

#[test]
fn normalization_is_idempotent() {
    let text = "const builtin = @import(\"builtin\");\n\
                test \"a\" {\n    try expect(true);\n}\n\n\
                test \"b\" {\n    if (builtin.zig_backend == .stage2_spirv) return error.SkipZigTest;\n}\n\
                test {\n    _ = @import(\"c.zig\");\n}";
    let once = normalize(text);
    let twice = normalize(&once);
    assert_eq!(once, twice);
}

#[test]
fn every_case_has_exactly_one_marker_after_normalization() {
    let text = "test \"a\" {\n}\n\
                test \"b\" {\n    if (builtin.zig_backend == .stage2_x86_64) return error.SkipZigTest;\n    try expect(true);\n}\n\
                test \"c\" {\n    if (builtin.zig_backend == .stage2_spirv) return error.SkipZigTest;\n}\n";
    let lines = normalize_lines(&split_lines(text));
    let mut markers_per_case = Vec::new();
    for line in &lines {
        if is_declaration(line) {
            markers_per_case.push(0);
        } else if is_marker(line) {
            *markers_per_case.last_mut().expect("marker before any case") += 1;
        }
    }
    assert_eq!(markers_per_case, vec![1, 1, 1]);
}

#[test]
fn near_miss_marker_in_prologue_is_replaced_in_place() {
    let text = "test \"old spelling\" {\n\
                \tif (builtin.zig_backend == .stage2_spirv) return error.SkipZigTest;\n\
                \ttry expect(true);\n}\n";
    let expected = format!(
        "test \"old spelling\" {{\n\t{MARKER_TEXT} // generated\n\ttry expect(true);\n}}\n"
    );
    assert_eq!(normalize(text), expected);
}

#[test]
fn last_candidate_in_prologue_wins() {
    let text = "test \"two\" {\n\
                \x20   if (builtin.zig_backend == .stage2_spirv) return error.SkipZigTest;\n\
                \x20   // keep going\n\
                \x20   if (builtin.zig_backend == .stage2_spirv and false) return error.SkipZigTest;\n\
                \x20   try expect(true);\n}\n";
    let lines = normalize_lines(&split_lines(text));
    assert_eq!(
        lines[1],
        "    if (builtin.zig_backend == .stage2_spirv) return error.SkipZigTest;\n"
    );
    assert_eq!(lines[3], generated());
    assert_eq!(lines.len(), 6);
}

#[test]
fn stale_candidate_after_statement_gets_fresh_insertion() {
    let stale = "    if (builtin.zig_backend == .stage2_spirv) return error.SkipZigTest;\n";
    let text = format!("test \"late\" {{\n    try expect(true);\n{stale}}}\n");
    let expected = format!(
        "test \"late\" {{\n{}\n    try expect(true);\n{stale}}}\n",
        generated()
    );
    assert_eq!(normalize(&text), expected);
}

#[test]
fn other_backend_skips_are_not_candidates() {
    let text = "test \"x86\" {\n    if (builtin.zig_backend == .stage2_x86_64) return error.SkipZigTest;\n}\n";
    let lines = normalize_lines(&split_lines(text));
    assert_eq!(lines[1], generated());
    assert_eq!(lines[2], "\n");
    assert_eq!(
        lines[3],
        "    if (builtin.zig_backend == .stage2_x86_64) return error.SkipZigTest;\n"
    );
}

#[test]
fn content_before_first_case_is_ignored() {
    let text = "// if (builtin.zig_backend == .stage2_spirv) nothing\nconst x = 1;\n";
    assert_eq!(normalize(text), text);
}

#[test]
fn block_guard_is_left_intact_and_gets_fresh_marker() {
    let guard = "    if (builtin.zig_backend == .stage2_spirv64) {\n\
                 \x20       return error.SkipZigTest;\n\
                 \x20   }\n";
    let text = format!("test \"blk\" {{\n{guard}    try expect(true);\n}}\n");
    let expected = format!(
        "test \"blk\" {{\n{}\n{guard}    try expect(true);\n}}\n",
        generated()
    );
    let normalized = normalize(&text);
    assert_eq!(normalized, expected);
    assert_eq!(
        normalized.matches('{').count(),
        normalized.matches('}').count()
    );
    assert_eq!(normalize(&normalized), normalized);
}
