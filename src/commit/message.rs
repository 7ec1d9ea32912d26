//! Conventional commit messages and the generation pipeline.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::commit::diff::ChangeSet;
use crate::commit::normalize::normalize;
use crate::commit::sizer::{DiffPayload, DiffStrategy};
use crate::config::ProviderConfig;
use crate::error::CommitError;
use crate::prompt::{ContextHint, ModelTier, Prompt, PromptBuilder, TemplateStore};
use crate::provider::{Transport, request_completion};

/// Longest subject line accepted by the format rules.
pub const MAX_SUBJECT_LEN: usize = 70;

/// Longest scope, in words.
pub const MAX_SCOPE_WORDS: usize = 3;

/// Header pattern: `type(scope)!: subject`.
static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w+)(?:\(([^)]+)\))?(!)?: (.+)$").expect("header pattern is valid")
});

/// Conventional commit types accepted in generated messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Chore,
}

impl CommitType {
    pub const ALL: [CommitType; 8] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Docs,
        CommitType::Style,
        CommitType::Refactor,
        CommitType::Perf,
        CommitType::Test,
        CommitType::Chore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Docs => "docs",
            CommitType::Style => "style",
            CommitType::Refactor => "refactor",
            CommitType::Perf => "perf",
            CommitType::Test => "test",
            CommitType::Chore => "chore",
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitType {
    type Err = String;

    /// Exact lowercase match; `Feat` is not a valid type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommitType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown commit type: {s}"))
    }
}

/// A message split into its conventional commit parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitMessage {
    /// The type as written, valid or not.
    pub raw_type: String,
    /// The type, if it is one of [`CommitType::ALL`].
    pub commit_type: Option<CommitType>,
    pub scope: Option<String>,
    pub breaking: bool,
    pub subject: String,
    pub body: Option<String>,
}

impl CommitMessage {
    /// Parse `type(scope): subject` plus an optional body.
    ///
    /// Returns `None` when the first line does not follow the format.
    pub fn parse(message: &str) -> Option<Self> {
        let message = message.trim();
        let (header, rest) = match message.split_once('\n') {
            Some((header, rest)) => (header.trim(), rest),
            None => (message, ""),
        };

        let caps = HEADER.captures(header)?;
        let raw_type = caps.get(1)?.as_str().to_string();
        let body = rest.trim();

        Some(Self {
            commit_type: raw_type.parse().ok(),
            raw_type,
            scope: caps.get(2).map(|m| m.as_str().trim().to_string()),
            breaking: caps.get(3).is_some(),
            subject: caps.get(4)?.as_str().trim().to_string(),
            body: (!body.is_empty()).then(|| body.to_string()),
        })
    }

    /// Format the message for git.
    pub fn format(&self) -> String {
        let mut header = self.raw_type.clone();
        if let Some(scope) = &self.scope {
            header.push_str(&format!("({scope})"));
        }
        if self.breaking {
            header.push('!');
        }
        header.push_str(": ");
        header.push_str(&self.subject);

        match self.body.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
            Some(body) => format!("{header}\n\n{body}"),
            None => header,
        }
    }

    pub fn scope_word_count(&self) -> usize {
        let Some(scope) = self.scope.as_deref() else {
            return 0;
        };
        scope
            .split(|c: char| c.is_whitespace() || matches!(c, '-' | '_' | ','))
            .filter(|w| !w.is_empty())
            .count()
    }
}

/// The result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMessage {
    /// Normalized message text, never empty.
    pub text: String,
    pub tier: ModelTier,
    pub strategy: DiffStrategy,
    pub hints: Vec<ContextHint>,
}

/// Size the diff, classify the model and compose the prompt.
///
/// No network activity happens here; used by the pipeline and by prompt
/// previews.
pub fn prepare_prompt(
    config: &ProviderConfig,
    templates: &TemplateStore,
    changes: &ChangeSet,
    diff: &str,
    stats: Option<&str>,
) -> Result<(DiffPayload, Prompt), CommitError> {
    let payload = DiffPayload::build(changes, diff, stats)?;
    let tier = ModelTier::classify(&config.model);
    debug!(model = %config.model, %tier, "Classified model tier");

    let prompt = PromptBuilder::new(templates).build(tier, changes, &payload, config.provider);
    Ok((payload, prompt))
}

/// Generate a commit message for a changeset.
///
/// Validates the config, sizes the diff, builds the prompt, calls the
/// provider once and normalizes the answer. An empty answer is
/// [`CommitError::GenerationFailed`].
pub async fn generate_commit_message(
    config: &ProviderConfig,
    templates: &TemplateStore,
    changes: &ChangeSet,
    diff: &str,
    stats: Option<&str>,
    transport: &dyn Transport,
) -> Result<GeneratedMessage, CommitError> {
    config.validate()?;
    let (payload, prompt) = prepare_prompt(config, templates, changes, diff, stats)?;

    info!(
        provider = %config.provider,
        model = %config.model,
        strategy = %payload.strategy,
        "Generating commit message"
    );

    let raw = request_completion(config, &prompt, transport).await?;
    debug!(raw_len = raw.len(), "Received raw message");

    let text = normalize(&raw);
    if text.is_empty() {
        return Err(CommitError::GenerationFailed {
            provider: config.provider,
        });
    }

    Ok(GeneratedMessage {
        text,
        tier: prompt.tier,
        strategy: payload.strategy,
        hints: prompt.hints,
    })
}
