//! Provider adapters: request building, transport and response parsing.
//!
//! Every backend is a [`ProviderKind`] variant. Request construction and
//! response parsing are exhaustive matches over that enum, so the set of
//! supported providers is checked at compile time.

pub mod json;
pub mod ollama;
pub mod request;
pub mod response;
pub mod transport;

pub use ollama::check_model_available;
pub use request::HttpRequest;
pub use transport::{HttpTransport, RawResponse, Transport};

use tracing::debug;

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::CommitError;
use crate::prompt::Prompt;

/// Longest body excerpt kept in HTTP status errors.
const STATUS_EXCERPT_LEN: usize = 200;

/// Send one generation request and return the provider's raw message text.
///
/// Non-2xx responses are parsed first so that structured API errors and
/// down-pages keep their classification; anything else becomes
/// [`CommitError::ProviderApiError`] carrying the status code.
pub async fn request_completion(
    config: &ProviderConfig,
    prompt: &Prompt,
    transport: &dyn Transport,
) -> Result<String, CommitError> {
    let provider = config.provider;
    let request = provider.build_request(
        config.endpoint_root(),
        &config.model,
        prompt,
        config.api_key.as_deref(),
    );
    debug!(%provider, model = %config.model, url = %request.url, "Requesting completion");

    let response = transport.send(provider, &request).await?;
    let parsed = provider.parse_response(&response.body);

    if response.is_success() {
        return parsed;
    }

    match parsed {
        Err(e @ (CommitError::ProviderUnreachable { .. } | CommitError::ProviderApiError { .. })) => {
            Err(e)
        }
        _ => Err(status_error(provider, &response)),
    }
}

fn status_error(provider: ProviderKind, response: &RawResponse) -> CommitError {
    let body = String::from_utf8_lossy(&response.body);
    let excerpt: String = body.trim().chars().take(STATUS_EXCERPT_LEN).collect();
    let message = if excerpt.is_empty() {
        format!("HTTP {}", response.status)
    } else {
        format!("HTTP {}: {}", response.status, excerpt)
    };
    CommitError::ProviderApiError { provider, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{FORMAT_REMINDER, ModelTier, PromptStyle, SYSTEM_PROMPT};
    use crate::provider::transport::MockTransport;

    fn prompt() -> Prompt {
        Prompt {
            tier: ModelTier::Small,
            style: PromptStyle::Completion,
            system: SYSTEM_PROMPT.to_string(),
            user: "changes".to_string(),
            format_reminder: FORMAT_REMINDER.to_string(),
            hints: Vec::new(),
        }
    }

    fn responding(status: u16, body: &'static str) -> MockTransport {
        let mut transport = MockTransport::new();
        transport.expect_send().times(1).returning(move |_, _| {
            Ok(RawResponse {
                status,
                body: body.as_bytes().to_vec(),
            })
        });
        transport
    }

    fn ollama() -> ProviderConfig {
        ProviderConfig::defaults_for(ProviderKind::Ollama).unwrap()
    }

    #[tokio::test]
    async fn test_success() {
        let transport = responding(200, r#"{"response":"fix: typo"}"#);
        let text = request_completion(&ollama(), &prompt(), &transport).await.unwrap();
        assert_eq!(text, "fix: typo");
    }

    #[tokio::test]
    async fn test_error_status_with_api_error_body() {
        let transport = responding(404, r#"{"error":"model 'qwen3:1.7b' not found"}"#);
        let err = request_completion(&ollama(), &prompt(), &transport).await.unwrap_err();
        assert!(matches!(err, CommitError::ProviderApiError { ref message, .. } if message.contains("not found")));
    }

    #[tokio::test]
    async fn test_error_status_with_not_found_page() {
        let transport = responding(404, "404 page not found");
        let err = request_completion(&ollama(), &prompt(), &transport).await.unwrap_err();
        assert!(matches!(err, CommitError::ProviderUnreachable { .. }));
    }

    #[tokio::test]
    async fn test_error_status_with_plain_body() {
        let transport = responding(502, "Bad Gateway");
        let err = request_completion(&ollama(), &prompt(), &transport).await.unwrap_err();
        match err {
            CommitError::ProviderApiError { message, .. } => assert_eq!(message, "HTTP 502: Bad Gateway"),
            other => panic!("expected ProviderApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_status_with_valid_completion_is_still_an_error() {
        let transport = responding(500, r#"{"response":"fix: typo"}"#);
        let err = request_completion(&ollama(), &prompt(), &transport).await.unwrap_err();
        assert!(matches!(err, CommitError::ProviderApiError { .. }));
    }
}
