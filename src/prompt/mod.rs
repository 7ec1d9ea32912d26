//! Prompt construction: model tiers, context hints and instruction templates.

pub mod builder;
pub mod hints;
pub mod template;
pub mod tier;

pub use builder::{FORMAT_REMINDER, Prompt, PromptBuilder, PromptStyle, SYSTEM_PROMPT};
pub use hints::{ContextHint, compute_hints};
pub use template::{TEMPLATE_DIR_ENV_VAR, TemplateStore};
pub use tier::ModelTier;
