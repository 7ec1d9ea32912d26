//! Provider-specific request construction.

use reqwest::Method;
use serde_json::json;

use crate::config::ProviderKind;
use crate::prompt::Prompt;

/// Sent as `HTTP-Referer` to OpenRouter for app attribution.
pub const OPENROUTER_REFERER: &str = "https://github.com/mrgoonie/cmai";

/// Sent as `X-Title` to OpenRouter.
pub const OPENROUTER_TITLE: &str = "cmai - AI Commit Message Generator";

/// A fully built HTTP request, independent of any client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    fn post(url: String, body: String) -> Self {
        Self {
            method: Method::POST,
            url,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body,
        }
    }

    fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl ProviderKind {
    /// Build the generation request for this provider.
    pub fn build_request(
        &self,
        endpoint_root: &str,
        model: &str,
        prompt: &Prompt,
        credential: Option<&str>,
    ) -> HttpRequest {
        let root = endpoint_root.trim_end_matches('/');
        let credential = credential.map(str::trim).filter(|k| !k.is_empty());

        match self {
            ProviderKind::Ollama => {
                let body = json!({
                    "model": model,
                    "prompt": prompt.completion_text(),
                    "think": false,
                    "stream": false,
                });
                HttpRequest::post(format!("{root}/generate"), body.to_string())
            }
            ProviderKind::OpenRouter => {
                let mut request =
                    HttpRequest::post(format!("{root}/chat/completions"), chat_body(model, prompt))
                        .with_header("HTTP-Referer", OPENROUTER_REFERER)
                        .with_header("X-Title", OPENROUTER_TITLE);
                if let Some(key) = credential {
                    request = request.with_header("Authorization", format!("Bearer {key}"));
                }
                request
            }
            ProviderKind::Custom => {
                let request =
                    HttpRequest::post(format!("{root}/chat/completions"), chat_body(model, prompt));
                match credential {
                    Some(key) => request.with_header("Authorization", format!("Bearer {key}")),
                    None => request,
                }
            }
            ProviderKind::LmStudio => {
                HttpRequest::post(format!("{root}/chat/completions"), chat_body(model, prompt))
            }
        }
    }
}

fn chat_body(model: &str, prompt: &Prompt) -> String {
    json!({
        "model": model,
        "stream": false,
        "messages": [
            {"role": "system", "content": prompt.system},
            {"role": "user", "content": prompt.user},
        ],
    })
    .to_string()
}
