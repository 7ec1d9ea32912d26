//! Grading of generated messages against scenario expectations.

use std::fmt;

use serde::Serialize;

use crate::commit::message::{CommitMessage, CommitType, MAX_SCOPE_WORDS, MAX_SUBJECT_LEN};
use crate::batch::scenarios::Scenario;

/// A problem found in a generated message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    MissingFormat,
    InvalidType { got: String },
    WrongType { got: CommitType, expected: CommitType },
    WrongScope { got: Option<String>, expected: String },
    SubjectTooLong { len: usize },
    SubjectEndsWithPeriod,
    ScopeTooLong { words: usize },
    MissingBody,
}

impl Issue {
    /// Stable label used to group issues in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Issue::MissingFormat => "missing format",
            Issue::InvalidType { .. } => "invalid type",
            Issue::WrongType { .. } => "wrong type",
            Issue::WrongScope { .. } => "wrong scope",
            Issue::SubjectTooLong { .. } => "subject too long",
            Issue::SubjectEndsWithPeriod => "subject ends with period",
            Issue::ScopeTooLong { .. } => "scope too long",
            Issue::MissingBody => "missing body",
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::MissingFormat => write!(f, "Missing conventional commit format"),
            Issue::InvalidType { got } => write!(f, "Invalid type: {got}"),
            Issue::WrongType { got, expected } => {
                write!(f, "Wrong type: got {got}, expected {expected}")
            }
            Issue::WrongScope { got, expected } => write!(
                f,
                "Wrong scope: got {}, expected {expected}",
                got.as_deref().unwrap_or("none")
            ),
            Issue::SubjectTooLong { len } => write!(f, "Subject too long: {len} chars"),
            Issue::SubjectEndsWithPeriod => write!(f, "Subject should not end with period"),
            Issue::ScopeTooLong { words } => write!(f, "Scope too long: {words} words"),
            Issue::MissingBody => write!(f, "Missing body"),
        }
    }
}

/// Outcome of grading one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analysis {
    pub has_format: bool,
    pub actual_type: Option<String>,
    pub actual_scope: Option<String>,
    pub type_correct: bool,
    pub scope_correct: bool,
    /// Subject line, or the first line when the format is missing.
    pub subject: String,
    pub has_body: bool,
    pub issues: Vec<Issue>,
}

impl Analysis {
    /// Well-formed message with the expected type.
    pub fn is_match(&self) -> bool {
        self.has_format && self.type_correct
    }
}

/// Grade `message` against the scenario's expected type and scope.
pub fn analyze(message: &str, scenario: &Scenario) -> Analysis {
    let message = message.trim();
    let has_body = message
        .lines()
        .skip(1)
        .any(|line| !line.trim().is_empty());

    let Some(parsed) = CommitMessage::parse(message) else {
        let mut issues = vec![Issue::MissingFormat];
        if !has_body {
            issues.push(Issue::MissingBody);
        }
        return Analysis {
            has_format: false,
            actual_type: None,
            actual_scope: None,
            type_correct: false,
            scope_correct: false,
            subject: message.lines().next().unwrap_or("").trim().to_string(),
            has_body,
            issues,
        };
    };

    let mut issues = Vec::new();

    let type_correct = match parsed.commit_type {
        None => {
            issues.push(Issue::InvalidType {
                got: parsed.raw_type.clone(),
            });
            false
        }
        Some(got) if got != scenario.expected_type => {
            issues.push(Issue::WrongType {
                got,
                expected: scenario.expected_type,
            });
            false
        }
        Some(_) => true,
    };

    let scope_correct = match scenario.expected_scope {
        Some(expected) if parsed.scope.as_deref() != Some(expected) => {
            issues.push(Issue::WrongScope {
                got: parsed.scope.clone(),
                expected: expected.to_string(),
            });
            false
        }
        _ => true,
    };

    let subject_len = parsed.subject.chars().count();
    if subject_len > MAX_SUBJECT_LEN {
        issues.push(Issue::SubjectTooLong { len: subject_len });
    }
    if parsed.subject.ends_with('.') {
        issues.push(Issue::SubjectEndsWithPeriod);
    }

    let scope_words = parsed.scope_word_count();
    if scope_words > MAX_SCOPE_WORDS {
        issues.push(Issue::ScopeTooLong { words: scope_words });
    }

    if !has_body {
        issues.push(Issue::MissingBody);
    }

    Analysis {
        has_format: true,
        actual_type: Some(parsed.raw_type),
        actual_scope: parsed.scope,
        type_correct,
        scope_correct,
        subject: parsed.subject,
        has_body,
        issues,
    }
}
