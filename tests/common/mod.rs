//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use git2::{IndexAddOption, Oid, Repository, Signature};

use cmai::config::ProviderKind;
use cmai::error::CommitError;
use cmai::provider::{HttpRequest, RawResponse, Transport};

/// Get the path to test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Get the path to a provider response fixture.
pub fn response_fixture(name: &str) -> PathBuf {
    fixtures_dir().join("responses").join(name)
}

/// Read a fixture file as a string.
pub fn read_fixture(path: PathBuf) -> String {
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {:?}: {}", path, e))
}

/// Create a temporary directory for test output.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository with an author identity.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the repo root, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(path, contents).expect("Failed to write file");
    }

    /// Stage a single path.
    pub fn stage(&self, relative: &str) {
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(relative)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Stage everything and commit it. Returns the commit OID.
    pub fn commit_all(&self, message: &str) -> Oid {
        let sig = Signature::now("Test User", "test@example.com").expect("Failed to create signature");

        let mut index = self.repo.index().expect("Failed to get index");
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .expect("Failed to add files");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    pub fn head_message(&self) -> String {
        let commit = self.repo.head().unwrap().peel_to_commit().unwrap();
        commit.message().unwrap_or_default().to_string()
    }
}

type Responder = dyn Fn(usize, &HttpRequest) -> Result<RawResponse, CommitError> + Send + Sync;

/// In-process transport answering from a closure.
///
/// The closure receives the zero-based call index and the request. Every
/// request is recorded for later assertions.
pub struct ScriptedTransport {
    responder: Box<Responder>,
    calls: AtomicUsize,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new(
        responder: impl Fn(usize, &HttpRequest) -> Result<RawResponse, CommitError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with an Ollama-style body carrying `message`.
    pub fn ollama_message(message: &str) -> Self {
        let body = ollama_body(message);
        Self::new(move |_, _| Ok(RawResponse::ok(body.clone())))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        _provider: ProviderKind,
        request: &HttpRequest,
    ) -> Result<RawResponse, CommitError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        (self.responder)(call, request)
    }
}

/// Ollama `/generate` body with `message` as the response text.
pub fn ollama_body(message: &str) -> String {
    serde_json::json!({ "model": "test", "response": message, "done": true }).to_string()
}

/// OpenAI-compatible chat completion body with `message` as the content.
pub fn chat_body(message: &str) -> String {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": message } }]
    })
    .to_string()
}

pub fn unreachable(reason: &str) -> CommitError {
    CommitError::ProviderUnreachable {
        provider: ProviderKind::Ollama,
        reason: reason.to_string(),
    }
}
