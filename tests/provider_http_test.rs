//! Integration tests for the HTTP transport against mocked provider servers.

mod common;

use cmai::commit::{ChangeSet, generate_commit_message};
use cmai::config::{ProviderConfig, ProviderKind};
use cmai::error::CommitError;
use cmai::prompt::TemplateStore;
use cmai::provider::{HttpTransport, check_model_available};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DIFF: &str = "--- a/src/utils.py\n+++ b/src/utils.py\n@@ -1 +1 @@\n-    return \"@\" in email\n+    return \"@\" in email and \".\" in email\n";

fn changes() -> ChangeSet {
    ChangeSet::parse_name_status("M\tsrc/utils.py")
}

fn config_for(kind: ProviderKind, base_url: String, model: &str) -> ProviderConfig {
    ProviderConfig::default()
        .switch_provider(kind, Some(base_url), Some(model.to_string()))
        .expect("Failed to build config")
}

async fn generate(config: &ProviderConfig) -> Result<String, CommitError> {
    let transport = HttpTransport::new()?;
    generate_commit_message(
        config,
        &TemplateStore::builtin(),
        &changes(),
        DIFF,
        None,
        &transport,
    )
    .await
    .map(|generated| generated.text)
}

// =============================================================================
// OLLAMA
// =============================================================================

#[tokio::test]
async fn test_ollama_generate() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": "qwen3:1.7b",
            "stream": false,
            "think": false
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(common::read_fixture(common::response_fixture("ollama_generate.json"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(ProviderKind::Ollama, format!("{}/api", server.uri()), "qwen3:1.7b");
    let message = generate(&config).await.unwrap();

    assert!(message.starts_with("fix(utils): require a dot in email domains\n\n"));
}

#[tokio::test]
async fn test_ollama_prompt_carries_diff_and_small_template() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::ollama_body("fix: x")))
        .mount(&server)
        .await;

    let config = config_for(ProviderKind::Ollama, format!("{}/api", server.uri()), "qwen3:1.7b");
    generate(&config).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["prompt"].as_str().unwrap();
    assert!(prompt.contains("M src/utils.py"));
    assert!(prompt.contains("\"@\" in email and \".\" in email"));
    assert!(prompt.contains("Example 1"), "small models get the verbose template");
}

#[tokio::test]
async fn test_ollama_404_page_is_unreachable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(404).set_body_string("404 page not found"))
        .mount(&server)
        .await;

    // Wrong base URL suffix is the usual cause
    let config = config_for(ProviderKind::Ollama, format!("{}/api", server.uri()), "qwen3:1.7b");
    let err = generate(&config).await.unwrap_err();

    match err {
        CommitError::ProviderUnreachable { provider, .. } => assert_eq!(provider, ProviderKind::Ollama),
        other => panic!("Expected ProviderUnreachable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_ollama_model_check() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                { "name": "qwen3:1.7b", "model": "qwen3:1.7b" },
                { "name": "llama3.2:latest", "model": "llama3.2:latest" }
            ]
        })))
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let root = format!("{}/api", server.uri());

    let installed = config_for(ProviderKind::Ollama, root.clone(), "qwen3:1.7b");
    assert!(check_model_available(&installed, &transport).await.is_ok());

    let untagged = config_for(ProviderKind::Ollama, root.clone(), "llama3.2");
    assert!(check_model_available(&untagged, &transport).await.is_ok());

    let missing = config_for(ProviderKind::Ollama, root, "mistral:7b");
    let err = check_model_available(&missing, &transport).await.unwrap_err();
    assert!(matches!(err, CommitError::ModelNotFound { ref model } if model == "mistral:7b"));
    assert!(err.to_string().contains("ollama pull mistral:7b"));
}

// =============================================================================
// OPENROUTER
// =============================================================================

#[tokio::test]
async fn test_openrouter_chat_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-or-test"))
        .and(header_exists("X-Title"))
        .and(header_exists("HTTP-Referer"))
        .and(body_partial_json(json!({ "model": "google/gemini-flash-1.5-8b" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(common::read_fixture(common::response_fixture("openrouter_chat.json"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(
        ProviderKind::OpenRouter,
        format!("{}/api/v1", server.uri()),
        "google/gemini-flash-1.5-8b",
    )
    .with_api_key(Some("sk-or-test".to_string()));

    let message = generate(&config).await.unwrap();
    assert_eq!(
        message,
        "feat(auth): add OAuth token exchange\n\n- Add OAuthManager with access token retrieval\n- Export it from the auth package"
    );
}

#[tokio::test]
async fn test_openrouter_api_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_string(common::read_fixture(common::response_fixture("openrouter_error.json"))),
        )
        .mount(&server)
        .await;

    let config = config_for(
        ProviderKind::OpenRouter,
        format!("{}/api/v1", server.uri()),
        "google/gemini-flash-1.5-8b",
    )
    .with_api_key(Some("sk-or-bad".to_string()));

    let err = generate(&config).await.unwrap_err();
    match err {
        CommitError::ProviderApiError { message, .. } => assert_eq!(message, "No auth credentials found"),
        other => panic!("Expected ProviderApiError, got {:?}", other),
    }
}

// =============================================================================
// LM STUDIO / CUSTOM
// =============================================================================

#[tokio::test]
async fn test_lmstudio_sends_no_auth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::chat_body("fix(utils): check domain dot")))
        .mount(&server)
        .await;

    // The stored key must not leak to a local server
    let config = config_for(ProviderKind::LmStudio, format!("{}/v1", server.uri()), "qwen2.5-7b-instruct")
        .with_api_key(Some("sk-or-secret".to_string()));
    let message = generate(&config).await.unwrap();
    assert_eq!(message, "fix(utils): check domain dot");

    let requests = server.received_requests().await.unwrap();
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_lmstudio_html_page_is_unreachable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(common::read_fixture(common::response_fixture("lmstudio_html.html"))),
        )
        .mount(&server)
        .await;

    let config = config_for(ProviderKind::LmStudio, format!("{}/v1", server.uri()), "default");
    let err = generate(&config).await.unwrap_err();
    assert!(matches!(err, CommitError::ProviderUnreachable { provider: ProviderKind::LmStudio, .. }));
}

#[tokio::test]
async fn test_custom_server_error_carries_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream timed out"))
        .mount(&server)
        .await;

    let config = config_for(ProviderKind::Custom, format!("{}/v1/", server.uri()), "my-model");
    let err = generate(&config).await.unwrap_err();
    match err {
        CommitError::ProviderApiError { provider, message } => {
            assert_eq!(provider, ProviderKind::Custom);
            assert_eq!(message, "HTTP 502: upstream timed out");
        }
        other => panic!("Expected ProviderApiError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_message_is_generation_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(common::chat_body("   ")))
        .mount(&server)
        .await;

    let config = config_for(ProviderKind::Custom, format!("{}/v1", server.uri()), "my-model");
    let err = generate(&config).await.unwrap_err();
    assert!(matches!(err, CommitError::GenerationFailed { provider: ProviderKind::Custom }));
}
