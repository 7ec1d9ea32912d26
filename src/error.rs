//! Error types for cmai modules using thiserror.

use thiserror::Error;

use crate::config::ProviderKind;

/// Errors from the commit message pipeline.
///
/// During a live invocation every variant is fatal. The batch tester recovers
/// from the variants reported by [`CommitError::is_recoverable`].
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("No API key configured for {provider}. Provide one with: cmai --api-key <KEY>")]
    ConfigMissingCredential { provider: ProviderKind },

    #[error("No staged changes found. Stage your changes with 'git add' first.")]
    NoStagedChanges,

    #[error("{provider} is unreachable: {reason}. {}", .provider.unreachable_hint())]
    ProviderUnreachable {
        provider: ProviderKind,
        reason: String,
    },

    #[error("{provider} API error: {message}")]
    ProviderApiError {
        provider: ProviderKind,
        message: String,
    },

    #[error("Failed to parse {provider} response: {detail}")]
    ResponseParseError {
        provider: ProviderKind,
        detail: String,
    },

    #[error("Failed to generate commit message: {provider} returned an empty message")]
    GenerationFailed { provider: ProviderKind },

    #[error("git {operation} failed: {detail}")]
    GitOperationFailed {
        operation: &'static str,
        detail: String,
    },

    #[error("Model '{model}' not found in Ollama. Pull it first with: ollama pull {model}")]
    ModelNotFound { model: String },

    #[error("Invalid provider configuration: {0}")]
    InvalidConfig(String),
}

impl CommitError {
    /// Whether a batch run should record this error for the round and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CommitError::ProviderUnreachable { .. }
                | CommitError::ProviderApiError { .. }
                | CommitError::ResponseParseError { .. }
                | CommitError::GenerationFailed { .. }
        )
    }

    /// Short label used in batch reports.
    pub fn kind(&self) -> &'static str {
        match self {
            CommitError::ConfigMissingCredential { .. } => "ConfigMissingCredential",
            CommitError::NoStagedChanges => "NoStagedChanges",
            CommitError::ProviderUnreachable { .. } => "ProviderUnreachable",
            CommitError::ProviderApiError { .. } => "ProviderAPIError",
            CommitError::ResponseParseError { .. } => "ResponseParseError",
            CommitError::GenerationFailed { .. } => "GenerationFailed",
            CommitError::GitOperationFailed { .. } => "GitOperationFailed",
            CommitError::ModelNotFound { .. } => "ModelNotFound",
            CommitError::InvalidConfig(_) => "InvalidConfig",
        }
    }

    pub(crate) fn git(operation: &'static str, err: impl std::fmt::Display) -> Self {
        CommitError::GitOperationFailed {
            operation,
            detail: err.to_string(),
        }
    }
}

/// Errors from the persisted configuration store.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine config directory: HOME is not set (set CMAI_CONFIG_DIR instead)")]
    NoConfigDir,

    #[error("Failed to create config directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read config value {key}: {source}")]
    Read {
        key: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config value {key}: {source}")]
    Write {
        key: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown provider '{0}'. Expected one of: openrouter, ollama, lmstudio, custom")]
    UnknownProvider(String),

    #[error("The custom provider requires an explicit base URL: cmai --use-custom <URL>")]
    CustomUrlRequired,
}

/// Errors from the batch tester.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Unknown scenario '{0}'. Run 'cmai scenarios' to list them.")]
    UnknownScenario(String),

    #[error("Invalid model spec '{0}'. Expected <model> or <provider>:<model>")]
    InvalidModelSpec(String),

    #[error("Failed to write report to {path}: {source}")]
    ReportWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize report: {0}")]
    Serialize(#[source] serde_json::Error),
}
