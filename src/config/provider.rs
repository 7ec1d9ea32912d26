//! Provider identities, their defaults, and the per-invocation provider config.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CommitError, ConfigError};

/// Supported AI backends.
///
/// Dispatch on this enum is always an exhaustive `match`, so adding a backend
/// fails to compile until every request builder and response parser handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenRouter,
    Ollama,
    LmStudio,
    Custom,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenRouter,
        ProviderKind::Ollama,
        ProviderKind::LmStudio,
        ProviderKind::Custom,
    ];

    /// Identifier used in the config store and on the command line.
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::Ollama => "ollama",
            ProviderKind::LmStudio => "lmstudio",
            ProviderKind::Custom => "custom",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "OpenRouter",
            ProviderKind::Ollama => "Ollama",
            ProviderKind::LmStudio => "LM Studio",
            ProviderKind::Custom => "Custom provider",
        }
    }

    /// Documented base URL, or `None` for the custom provider.
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenRouter => Some("https://openrouter.ai/api/v1"),
            ProviderKind::Ollama => Some("http://localhost:11434/api"),
            ProviderKind::LmStudio => Some("http://localhost:1234/v1"),
            ProviderKind::Custom => None,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "google/gemini-flash-1.5-8b",
            ProviderKind::Ollama => "qwen3:1.7b",
            ProviderKind::LmStudio => "default",
            ProviderKind::Custom => "",
        }
    }

    pub fn requires_credential(&self) -> bool {
        matches!(self, ProviderKind::OpenRouter)
    }

    /// Completion-style backends take one prompt string instead of chat messages.
    pub fn is_completion_style(&self) -> bool {
        matches!(self, ProviderKind::Ollama)
    }

    /// Remediation shown when the backend cannot be reached.
    pub fn unreachable_hint(&self) -> &'static str {
        match self {
            ProviderKind::OpenRouter => "Check your network connection and https://status.openrouter.ai",
            ProviderKind::Ollama => "Is the Ollama server running? Start it with: ollama serve",
            ProviderKind::LmStudio => {
                "Is LM Studio running with its local server started on the configured port?"
            }
            ProviderKind::Custom => "Check the base URL configured with --use-custom or --base-url",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openrouter" => Ok(ProviderKind::OpenRouter),
            "ollama" => Ok(ProviderKind::Ollama),
            "lmstudio" | "lm-studio" => Ok(ProviderKind::LmStudio),
            "custom" => Ok(ProviderKind::Custom),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// The provider settings for one invocation.
///
/// Loaded once at startup and passed by reference through the pipeline.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl ProviderConfig {
    /// Defaults for a provider. The custom provider has no default URL.
    pub fn defaults_for(provider: ProviderKind) -> Result<Self, ConfigError> {
        let base_url = provider
            .default_base_url()
            .ok_or(ConfigError::CustomUrlRequired)?;
        Ok(Self {
            provider,
            base_url: base_url.to_string(),
            model: provider.default_model().to_string(),
            api_key: None,
        })
    }

    /// Switch to another provider.
    ///
    /// Base URL and model reset to the new provider's defaults unless an
    /// override is given. The credential is kept.
    pub fn switch_provider(
        &self,
        provider: ProviderKind,
        base_url: Option<String>,
        model: Option<String>,
    ) -> Result<Self, ConfigError> {
        let base_url = match base_url.filter(|u| !u.trim().is_empty()) {
            Some(url) => url.trim().to_string(),
            None => provider
                .default_base_url()
                .ok_or(ConfigError::CustomUrlRequired)?
                .to_string(),
        };
        let model = model
            .map(|m| clean_model(&m))
            .unwrap_or_else(|| provider.default_model().to_string());

        Ok(Self {
            provider,
            base_url,
            model,
            api_key: self.api_key.clone(),
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = clean_model(model);
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }

    /// Base URL without a trailing slash, ready for endpoint paths.
    pub fn endpoint_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Check the config is usable before any network activity.
    pub fn validate(&self) -> Result<(), CommitError> {
        if self.provider.requires_credential()
            && self.api_key.as_deref().is_none_or(|k| k.trim().is_empty())
        {
            return Err(CommitError::ConfigMissingCredential {
                provider: self.provider,
            });
        }
        if self.endpoint_root().is_empty() {
            return Err(CommitError::InvalidConfig(format!(
                "no base URL configured for {}",
                self.provider
            )));
        }
        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let provider = ProviderKind::OpenRouter;
        Self {
            provider,
            base_url: provider.default_base_url().unwrap_or_default().to_string(),
            model: provider.default_model().to_string(),
            api_key: None,
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Model names are often pasted with surrounding quotes.
fn clean_model(model: &str) -> String {
    model.trim().trim_matches('"').trim_matches('\'').to_string()
}
