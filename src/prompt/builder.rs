//! Prompt composition.

use serde::Serialize;
use tracing::debug;

use crate::commit::diff::ChangeSet;
use crate::commit::sizer::{DiffPayload, DiffStrategy};
use crate::config::ProviderKind;
use crate::prompt::hints::{ContextHint, compute_hints, render_hints};
use crate::prompt::template::TemplateStore;
use crate::prompt::tier::ModelTier;

/// System message sent to chat-style providers.
pub const SYSTEM_PROMPT: &str =
    "You are a git commit message generator. Create conventional commit messages.";

/// The commit grammar reminder appended to every prompt.
pub const FORMAT_REMINDER: &str = "<type>(<scope>): <subject>\n\n<body>";

const STATS_ONLY_NOTE: &str = "Note: Diff content was too large to include. \
Please generate commit message based on file changes and statistics only.";

/// How the prompt is delivered to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    /// System and user messages.
    Chat,
    /// One prompt string.
    Completion,
}

/// A composed prompt, ready for a provider request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub tier: ModelTier,
    pub style: PromptStyle,
    pub system: String,
    pub user: String,
    pub format_reminder: String,
    pub hints: Vec<ContextHint>,
}

impl Prompt {
    /// The whole prompt as a single string for completion-style providers.
    pub fn completion_text(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

/// Builds prompts from templates, diff payloads and hints.
pub struct PromptBuilder<'a> {
    templates: &'a TemplateStore,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(templates: &'a TemplateStore) -> Self {
        Self { templates }
    }

    pub fn build(
        &self,
        tier: ModelTier,
        changes: &ChangeSet,
        payload: &DiffPayload,
        provider: ProviderKind,
    ) -> Prompt {
        let style = if provider.is_completion_style() {
            PromptStyle::Completion
        } else {
            PromptStyle::Chat
        };

        let hints = match tier {
            ModelTier::Small | ModelTier::Medium => compute_hints(changes, &payload.raw_diff),
            ModelTier::Large => Vec::new(),
        };

        let mut sections = vec![format!(
            "Generate a commit message for these changes:\n\n## File changes:\n<file_changes>\n{changes}\n</file_changes>"
        )];

        match payload.text.as_deref() {
            Some(diff) if payload.has_diff_text() => {
                sections.push(format!("## Diff:\n<diff>\n{diff}\n</diff>"));
            }
            _ => {
                let mut stats = format!("## File statistics:\n<file_stats>\n{}\n</file_stats>", payload.stats);
                if payload.strategy == DiffStrategy::StatsOnly {
                    stats.push_str("\n\n");
                    stats.push_str(STATS_ONLY_NOTE);
                }
                sections.push(stats);
            }
        }

        if !hints.is_empty() {
            sections.push(format!(
                "## Context hints (advisory, the diff takes precedence):\n{}",
                render_hints(&hints)
            ));
        }

        sections.push(format!("## Format:\n{FORMAT_REMINDER}"));
        sections.push(format!("## Instructions:\n{}", self.templates.get(tier)));

        let user = sections.join("\n\n");
        debug!(
            %tier,
            strategy = %payload.strategy,
            hints = hints.len(),
            prompt_len = user.len(),
            "Built prompt"
        );

        Prompt {
            tier,
            style,
            system: SYSTEM_PROMPT.to_string(),
            user,
            format_reminder: FORMAT_REMINDER.to_string(),
            hints,
        }
    }
}
