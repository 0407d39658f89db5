//! Failure classification for executor stderr.
//!
//! Labels come from an ordered rule list: the first matching rule wins. Output
//! that matches no rule falls through to the TODO scan, then to `unknown`.
use std::collections::BTreeSet;

pub const TIMEOUT_LABEL: &str = "timeout expired";
pub const UNKNOWN_LABEL: &str = "unknown";

const AIR_TAG_PREFIX: &str = "TODO (SPIR-V): implement AIR tag ";
const TODO_PREFIX: &str = "TODO (SPIR-V): ";

/// How a rule inspects stderr.
#[derive(Debug, Clone, Copy)]
enum Matcher {
    Contains(&'static str),
    ContainsAny(&'static [&'static str]),
}

impl Matcher {
    fn matches(&self, stderr: &str) -> bool {
        match self {
            Matcher::Contains(needle) => stderr.contains(needle),
            Matcher::ContainsAny(needles) => needles.iter().any(|needle| stderr.contains(needle)),
        }
    }
}

struct Rule {
    matcher: Matcher,
    label: &'static str,
}

const fn rule(matcher: Matcher, label: &'static str) -> Rule {
    Rule { matcher, label }
}

const RULES: &[Rule] = &[
    rule(Matcher::Contains("panic: reached unreachable code"), "unreachable"),
    rule(Matcher::Contains("panic: index out of bounds"), "index out of bounds"),
    rule(Matcher::Contains("panic: "), "panic"),
    rule(
        Matcher::ContainsAny(&["Segmentation fault", "SIGSEGV"]),
        "segfault",
    ),
    rule(
        Matcher::ContainsAny(&[
            "TEST FAILED",
            "error: TestUnexpectedResult",
            "error: TestExpectedEqual",
        ]),
        "test failure",
    ),
    rule(
        Matcher::ContainsAny(&["type 'f80'", "type 'f128'", "unsupported float type"]),
        "unsupported float type",
    ),
    rule(
        Matcher::ContainsAny(&["undefined symbol", "missing symbol"]),
        "missing symbol",
    ),
    rule(
        Matcher::ContainsAny(&["the following build command failed", "LLVM ERROR"]),
        "backend build failure",
    ),
    rule(
        Matcher::ContainsAny(&["validation failed", "spirv-val"]),
        "validation failure",
    ),
    rule(
        Matcher::Contains("function pointers"),
        "illegal use of function pointers",
    ),
    rule(
        Matcher::ContainsAny(&["pointer arithmetic", "OpPtrAccessChain", "aliasing"]),
        "illegal pointer arithmetic",
    ),
];

/// Map stderr of a failed execution to exactly one label.
pub fn classify(stderr: &str) -> String {
    if let Some(rule) = RULES.iter().find(|rule| rule.matcher.matches(stderr)) {
        return rule.label.to_string();
    }
    classify_todos(stderr)
}

fn classify_todos(stderr: &str) -> String {
    let mut air_tags = BTreeSet::new();
    let mut todos = BTreeSet::new();
    for line in stderr.lines() {
        if let Some((_, rest)) = line.split_once(AIR_TAG_PREFIX) {
            if let Some(tag) = rest.split_whitespace().last() {
                air_tags.insert(tag.to_string());
            }
        } else if let Some((_, rest)) = line.split_once(TODO_PREFIX) {
            let rest = rest.trim();
            if !rest.is_empty() {
                todos.insert(rest.to_string());
            }
        }
    }
    if !air_tags.is_empty() {
        return format!("missing air tags: {}", join(&air_tags));
    }
    if !todos.is_empty() {
        return format!("todo {}", join(&todos));
    }
    UNKNOWN_LABEL.to_string()
}

fn join(items: &BTreeSet<String>) -> String {
    items.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_order_prefers_specific_panics() {
        let stderr = "thread 1 panic: reached unreachable code\npanic: index out of bounds\n";
        assert_eq!(classify(stderr), "unreachable");
        assert_eq!(classify("panic: index out of bounds: 4"), "index out of bounds");
        assert_eq!(classify("panic: integer overflow"), "panic");
        assert_eq!(
            classify("panic: oops\nSegmentation fault at address 0x0"),
            "panic"
        );
        assert_eq!(classify("Segmentation fault at address 0x0"), "segfault");
    }

    #[test]
    fn known_causes_map_to_fixed_labels() {
        assert_eq!(classify("1 passed; 1 TEST FAILED"), "test failure");
        assert_eq!(
            classify("error: the following build command failed with exit code 1"),
            "backend build failure"
        );
        assert_eq!(
            classify("error: spirv-val: validation failed"),
            "validation failure"
        );
        assert_eq!(
            classify("error: cannot use function pointers on this target"),
            "illegal use of function pointers"
        );
        assert_eq!(classify("error: undefined symbol: foo"), "missing symbol");
        assert_eq!(
            classify("error: unsupported float type 'f80'"),
            "unsupported float type"
        );
    }

    #[test]
    fn air_tags_are_sorted_and_unique() {
        let stderr = "\
error: TODO (SPIR-V): implement AIR tag mul_add
error: TODO (SPIR-V): implement AIR tag atomic_rmw
error: TODO (SPIR-V): implement AIR tag mul_add
error: TODO (SPIR-V): lower packed structs
";
        assert_eq!(
            classify(stderr),
            "missing air tags: atomic_rmw, mul_add"
        );
    }

    #[test]
    fn generic_todos_when_no_air_tags() {
        let stderr = "error: TODO (SPIR-V): lower packed structs\n\
                      error: TODO (SPIR-V): implement error unions\n\
                      error: TODO (SPIR-V): lower packed structs\n";
        assert_eq!(
            classify(stderr),
            "todo implement error unions, lower packed structs"
        );
    }

    #[test]
    fn total_and_deterministic() {
        for stderr in ["", "\n", "something odd happened", "error: TODO (SPIR-V): "] {
            let first = classify(stderr);
            assert!(!first.is_empty());
            assert_eq!(first, classify(stderr));
        }
        assert_eq!(classify("something odd happened"), UNKNOWN_LABEL);
        assert_eq!(classify("error: TODO (SPIR-V): "), UNKNOWN_LABEL);
    }
}
