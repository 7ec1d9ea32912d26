//! Provider-specific response parsing.
//!
//! Bodies are classified before JSON parsing where a backend is known to
//! answer with plain text or HTML when it is not really serving the API.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde_json::Value;
use tracing::debug;

use crate::config::ProviderKind;
use crate::error::CommitError;
use crate::provider::json::decode_string_contents;

/// Plain-text body Ollama returns when the endpoint does not exist.
const OLLAMA_NOT_FOUND: &str = "404 page not found";

/// Longest body excerpt kept in error messages.
const EXCERPT_LEN: usize = 200;

/// Raw `"content": "..."` field, for bodies that are not valid JSON.
static CONTENT_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""content"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("content field pattern is valid")
});

impl ProviderKind {
    /// Extract the generated text from a response body.
    pub fn parse_response(&self, body: &[u8]) -> Result<String, CommitError> {
        let text = String::from_utf8_lossy(body);
        let trimmed = text.trim();

        match self {
            ProviderKind::Ollama if trimmed.eq_ignore_ascii_case(OLLAMA_NOT_FOUND) => {
                return Err(CommitError::ProviderUnreachable {
                    provider: *self,
                    reason: format!("endpoint answered '{OLLAMA_NOT_FOUND}'"),
                });
            }
            ProviderKind::LmStudio if looks_like_html(trimmed) => {
                return Err(CommitError::ProviderUnreachable {
                    provider: *self,
                    reason: "endpoint answered with an HTML page instead of the API".to_string(),
                });
            }
            _ => {}
        }

        let value = match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => value,
            Err(e) => {
                debug!(provider = %self, error = %e, "Response is not valid JSON");
                return match self {
                    ProviderKind::Ollama => Err(self.parse_error(format!(
                        "invalid JSON ({e}): {}",
                        excerpt(trimmed)
                    ))),
                    ProviderKind::OpenRouter | ProviderKind::LmStudio | ProviderKind::Custom => {
                        scan_content_field(trimmed).ok_or_else(|| {
                            self.parse_error(format!("invalid JSON ({e}): {}", excerpt(trimmed)))
                        })
                    }
                };
            }
        };

        if let Some(message) = api_error_message(&value) {
            return Err(CommitError::ProviderApiError {
                provider: *self,
                message,
            });
        }

        match self {
            ProviderKind::Ollama => value
                .get("response")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    self.parse_error(format!("missing 'response' field: {}", excerpt(trimmed)))
                }),
            ProviderKind::OpenRouter | ProviderKind::LmStudio | ProviderKind::Custom => value
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| scan_content_field(trimmed))
                .ok_or_else(|| {
                    self.parse_error(format!(
                        "missing 'choices[0].message.content': {}",
                        excerpt(trimmed)
                    ))
                }),
        }
    }

    fn parse_error(&self, detail: String) -> CommitError {
        CommitError::ResponseParseError {
            provider: *self,
            detail,
        }
    }
}

fn looks_like_html(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    body.starts_with('<') && (lower.contains("<html") || lower.contains("<!doctype"))
}

/// `error` as a string or as `{"message": ...}`.
fn api_error_message(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => Some(
            obj.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(obj.clone()).to_string()),
        ),
        other => Some(other.to_string()),
    }
}

/// Find the first `"content": "..."` string field in raw text.
fn scan_content_field(body: &str) -> Option<String> {
    let captures = CONTENT_FIELD.captures(body)?;
    let raw = captures.get(1)?.as_str();
    let decoded = decode_string_contents(raw).ok()?;
    debug!("Recovered message content with raw field scan");
    Some(decoded)
}

fn excerpt(body: &str) -> String {
    if body.chars().count() <= EXCERPT_LEN {
        body.to_string()
    } else {
        let cut: String = body.chars().take(EXCERPT_LEN).collect();
        format!("{cut}...")
    }
}
