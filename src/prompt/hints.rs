//! Heuristic context hints.
//!
//! Each rule inspects the changeset and diff for a signal pattern and, when
//! it fires, suggests a commit type. Hints are injected into the prompt as
//! advisory text only; the model's own answer is never overridden.

use std::collections::HashMap;

use serde::Serialize;

use crate::commit::diff::{ChangeSet, DiffLine, DiffLines, DiffStats, FileStatus};
use crate::commit::message::CommitType;

/// Minimum number of changed files that suggests a refactor.
pub const REFACTOR_FILE_THRESHOLD: usize = 4;

/// Minimum number of changed lines that suggests a refactor.
pub const REFACTOR_LINE_THRESHOLD: usize = 300;

/// Dependency manifests and lock files.
const DEPENDENCY_MANIFESTS: &[&str] = &[
    "package.json",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "cargo.toml",
    "cargo.lock",
    "requirements.txt",
    "requirements-dev.txt",
    "pipfile",
    "pipfile.lock",
    "pyproject.toml",
    "poetry.lock",
    "setup.py",
    "setup.cfg",
    "go.mod",
    "go.sum",
    "gemfile",
    "gemfile.lock",
    "composer.json",
    "composer.lock",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
];

/// Keywords on added lines that point at performance work.
const PERF_KEYWORDS: &[&str] = &[
    "cache",
    "batch",
    "parallel",
    "latency",
    "optimiz",
    "memoiz",
    "throughput",
    "select_related",
    "prefetch",
];

const DOC_EXTENSIONS: &[&str] = &["md", "rst", "adoc", "txt"];

/// A suggestion derived from the changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextHint {
    pub suggested: CommitType,
    pub reason: String,
}

/// Inputs shared by all hint rules.
pub struct HintInput<'a> {
    pub changes: &'a ChangeSet,
    pub diff: &'a str,
}

type HintRule = fn(&HintInput<'_>) -> Option<String>;

/// Rules in evaluation order.
const HINT_RULES: &[(CommitType, HintRule)] = &[
    (CommitType::Style, whitespace_only),
    (CommitType::Chore, dependency_manifests),
    (CommitType::Perf, performance_keywords),
    (CommitType::Docs, documentation_only),
    (CommitType::Test, tests_only),
    (CommitType::Refactor, wide_change),
];

/// Evaluate every rule and collect the hints that fire.
pub fn compute_hints(changes: &ChangeSet, diff: &str) -> Vec<ContextHint> {
    let input = HintInput { changes, diff };
    HINT_RULES
        .iter()
        .filter_map(|(suggested, rule)| {
            rule(&input).map(|reason| ContextHint {
                suggested: *suggested,
                reason,
            })
        })
        .collect()
}

/// Render hints as advisory prompt text.
pub fn render_hints(hints: &[ContextHint]) -> String {
    hints
        .iter()
        .map(|h| format!("- {} (consider type '{}')", h.reason, h.suggested))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Added lines of a unified diff.
fn added_lines(diff: &str) -> impl Iterator<Item = &str> {
    DiffLines::new(diff).filter_map(|line| match line {
        DiffLine::Added(text) => Some(text),
        _ => None,
    })
}

/// Removed and added lines of every file are identical once whitespace is
/// ignored.
///
/// Balancing is per file; code moved from one file to another is not a
/// formatting change.
fn whitespace_only(input: &HintInput<'_>) -> Option<String> {
    let mut files: Vec<HashMap<String, i64>> = vec![HashMap::new()];
    let mut changed = 0usize;

    for line in DiffLines::new(input.diff) {
        let (text, delta) = match line {
            DiffLine::FileHeader(_) => {
                files.push(HashMap::new());
                continue;
            }
            DiffLine::Removed(text) => (text, 1),
            DiffLine::Added(text) => (text, -1),
            DiffLine::Other => continue,
        };
        if let Some(balance) = files.last_mut() {
            *balance.entry(strip_whitespace(text)).or_default() += delta;
        }
        changed += 1;
    }

    // Blank lines added or removed are also formatting-only
    let balanced = files.iter().all(|balance| {
        balance
            .iter()
            .all(|(line, n)| line.is_empty() || *n == 0)
    });

    if changed == 0 || !balanced {
        return None;
    }
    Some("Only whitespace or indentation changed".to_string())
}

fn strip_whitespace(line: &str) -> String {
    line.chars().filter(|c| !c.is_whitespace()).collect()
}

fn dependency_manifests(input: &HintInput<'_>) -> Option<String> {
    let manifests: Vec<&str> = input
        .changes
        .iter()
        .map(|f| f.file_name())
        .filter(|name| DEPENDENCY_MANIFESTS.contains(&name.to_lowercase().as_str()))
        .collect();

    if manifests.is_empty() {
        return None;
    }
    Some(format!(
        "Dependency manifest changed: {}",
        manifests.join(", ")
    ))
}

fn performance_keywords(input: &HintInput<'_>) -> Option<String> {
    let added = added_lines(input.diff)
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("\n");

    let matched: Vec<&str> = PERF_KEYWORDS
        .iter()
        .copied()
        .filter(|kw| added.contains(kw))
        .collect();

    if matched.is_empty() {
        return None;
    }
    Some(format!(
        "Added code mentions optimization keywords: {}",
        matched.join(", ")
    ))
}

fn documentation_only(input: &HintInput<'_>) -> Option<String> {
    let all_docs = !input.changes.is_empty()
        && input.changes.iter().all(|f| {
            let lower = f.path.to_lowercase();
            lower.starts_with("docs/")
                || lower
                    .rsplit_once('.')
                    .is_some_and(|(_, ext)| DOC_EXTENSIONS.contains(&ext))
                    && !DEPENDENCY_MANIFESTS.contains(&f.file_name().to_lowercase().as_str())
        });

    all_docs.then(|| "Only documentation files changed".to_string())
}

fn tests_only(input: &HintInput<'_>) -> Option<String> {
    let all_tests = !input.changes.is_empty()
        && input.changes.iter().all(|f| {
            let lower = f.path.to_lowercase();
            let name = f.file_name().to_lowercase();
            lower.starts_with("tests/")
                || lower.starts_with("test/")
                || lower.contains("/tests/")
                || name.starts_with("test_")
                || name.contains("_test.")
                || name.contains(".test.")
                || name.contains(".spec.")
        });

    all_tests.then(|| "Only test files changed".to_string())
}

fn wide_change(input: &HintInput<'_>) -> Option<String> {
    let files = input.changes.len();
    let lines = DiffStats::from_diff(input.diff).changed_lines();
    let deleted = input
        .changes
        .iter()
        .filter(|f| f.status == FileStatus::Deleted)
        .count();

    if files < REFACTOR_FILE_THRESHOLD && lines < REFACTOR_LINE_THRESHOLD {
        return None;
    }
    let mut reason = format!("Change spans {files} files and {lines} changed lines");
    if deleted > 0 {
        reason.push_str(&format!(" ({deleted} removed)"));
    }
    Some(reason)
}
