//! cmai - AI-assisted conventional commit messages.
//!
//! # Overview
//!
//! cmai reads the staged changes of a git repository, sizes the diff to fit
//! small models, picks an instruction template for the model's size tier and
//! asks an AI provider (OpenRouter, Ollama, LM Studio or any OpenAI-compatible
//! endpoint) for a conventional commit message. The answer is normalized and
//! committed. A batch tester measures how well models classify a fixed set of
//! synthetic changes.

pub mod batch;
pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod prompt;
pub mod provider;

// Re-export commonly used types
pub use commit::{ChangeSet, CommitMessage, CommitType, GeneratedMessage, generate_commit_message};
pub use config::{ConfigStore, ProviderConfig, ProviderKind};
pub use error::{BatchError, CommitError, ConfigError};
pub use prompt::{ModelTier, TemplateStore};
pub use provider::{HttpTransport, Transport};
