//! Ollama preflight: make sure the server answers and the model is installed.

use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::CommitError;
use crate::provider::request::HttpRequest;
use crate::provider::transport::Transport;

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<InstalledModel>,
}

#[derive(Debug, Deserialize)]
struct InstalledModel {
    name: String,
    #[serde(default)]
    model: Option<String>,
}

/// Check that the configured Ollama model is installed.
///
/// Queries `GET {root}/tags`. A model given without a tag also matches its
/// `:latest` install.
pub async fn check_model_available(
    config: &ProviderConfig,
    transport: &dyn Transport,
) -> Result<(), CommitError> {
    let provider = ProviderKind::Ollama;
    let request = HttpRequest {
        method: Method::GET,
        url: format!("{}/tags", config.endpoint_root()),
        headers: Vec::new(),
        body: String::new(),
    };

    let response = transport.send(provider, &request).await?;
    let tags: TagsResponse = if response.is_success() {
        serde_json::from_slice(&response.body).map_err(|e| CommitError::ProviderUnreachable {
            provider,
            reason: format!("unexpected answer from {}: {e}", request.url),
        })?
    } else {
        return Err(CommitError::ProviderUnreachable {
            provider,
            reason: format!("{} answered HTTP {}", request.url, response.status),
        });
    };

    let installed: Vec<&str> = tags
        .models
        .iter()
        .flat_map(|m| std::iter::once(m.name.as_str()).chain(m.model.as_deref()))
        .collect();
    debug!(?installed, model = %config.model, "Checked installed Ollama models");

    if is_installed(&config.model, &installed) {
        Ok(())
    } else {
        Err(CommitError::ModelNotFound {
            model: config.model.clone(),
        })
    }
}

fn is_installed(model: &str, installed: &[&str]) -> bool {
    installed.iter().any(|name| {
        *name == model || (!model.contains(':') && name.strip_suffix(":latest") == Some(model))
    })
}
