//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use git2::{Oid, Repository, Signature};

use jarvis::InferenceConfig;
use jarvis::commit::{Decision, ReviewPrompt};
use jarvis::error::CommitError;
use jarvis::git::MESSAGE_FILE_PREFIX;

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
    remote: Option<tempfile::TempDir>,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory, with an
    /// identity configured so the `git` binary can commit.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config
                .set_str("user.name", "Test User")
                .expect("Failed to set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Failed to set user.email");
            config
                .set_bool("commit.gpgsign", false)
                .expect("Failed to set commit.gpgsign");
        }
        Self {
            dir,
            repo,
            remote: None,
        }
    }

    /// Attach a bare repository as `origin`.
    pub fn with_remote(mut self) -> Self {
        let remote = tempfile::tempdir().expect("Failed to create remote directory");
        Repository::init_bare(remote.path()).expect("Failed to init bare remote");
        self.repo
            .remote("origin", &remote.path().to_string_lossy())
            .expect("Failed to add origin");
        self.remote = Some(remote);
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    /// Write `contents` to `name` in the working tree.
    pub fn write(&self, name: &str, contents: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(path, contents).expect("Failed to write file");
    }

    pub fn remove(&self, name: &str) {
        std::fs::remove_file(self.dir.path().join(name)).expect("Failed to remove file");
    }

    /// Stage every file in the working tree and commit it. Returns the OID.
    pub fn commit_all(&self, message: &str) -> Oid {
        let mut index = self.repo.index().expect("Failed to get index");
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .expect("Failed to add files");
        index
            .update_all(["*"].iter(), None)
            .expect("Failed to update index");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let sig = self.signature();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Message of the HEAD commit, if there is one.
    pub fn head_message(&self) -> Option<String> {
        self.repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .and_then(|c| c.message().map(str::to_string))
    }

    pub fn commit_count(&self) -> usize {
        let mut walk = match self.repo.revwalk() {
            Ok(walk) => walk,
            Err(_) => return 0,
        };
        if walk.push_head().is_err() {
            return 0;
        }
        walk.count()
    }

    pub fn branch_name(&self) -> String {
        self.repo
            .head()
            .expect("Failed to read HEAD")
            .shorthand()
            .expect("Branch name is not UTF-8")
            .to_string()
    }

    /// Message of `branch` in the bare remote, if it was pushed.
    pub fn remote_message(&self, branch: &str) -> Option<String> {
        let remote = Repository::open_bare(self.remote.as_ref()?.path()).ok()?;
        let reference = remote.find_reference(&format!("refs/heads/{branch}")).ok()?;
        let commit = reference.peel_to_commit().ok()?;
        commit.message().map(str::to_string)
    }

    /// Number of transient commit message files left in `.git/`.
    pub fn leftover_message_files(&self) -> usize {
        std::fs::read_dir(self.repo.path())
            .expect("Failed to read .git directory")
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(MESSAGE_FILE_PREFIX))
            .count()
    }
}

/// Review prompt that answers from a fixed script and records what it saw.
pub struct ScriptedPrompt {
    answers: Mutex<Vec<Result<Decision, CommitError>>>,
    pub shown: Mutex<Vec<String>>,
    on_ask: Option<Box<dyn Fn(usize) + Send + Sync>>,
}

impl ScriptedPrompt {
    pub fn new(mut answers: Vec<Result<Decision, CommitError>>) -> Self {
        answers.reverse();
        Self {
            answers: Mutex::new(answers),
            shown: Mutex::new(Vec::new()),
            on_ask: None,
        }
    }

    pub fn accepting() -> Self {
        Self::new(vec![Ok(Decision::Accept)])
    }

    /// Run `hook` with the 1-based presentation number before answering.
    pub fn on_ask(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_ask = Some(Box::new(hook));
        self
    }

    pub fn times_asked(&self) -> usize {
        self.shown.lock().unwrap().len()
    }
}

#[async_trait]
impl ReviewPrompt for ScriptedPrompt {
    async fn ask(&self, message: &str) -> Result<Decision, CommitError> {
        let count = {
            let mut shown = self.shown.lock().unwrap();
            shown.push(message.to_string());
            shown.len()
        };
        if let Some(hook) = &self.on_ask {
            hook(count);
        }
        self.answers
            .lock()
            .unwrap()
            .pop()
            .expect("review prompt asked more times than scripted")
    }
}

/// Inference settings pointing at a mock server.
pub fn test_config(base_url: &str) -> InferenceConfig {
    InferenceConfig {
        api_key: "test-key".to_string(),
        model: "test-model".to_string(),
        system_prompt: "Summarize the staged diff in one sentence.".to_string(),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
    }
}

/// A chat completion response body with one choice.
pub fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

/// An SSE body streaming `fragments`, terminated by `[DONE]`.
pub fn sse_body(fragments: &[&str]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        let chunk = serde_json::json!({
            "choices": [{ "index": 0, "delta": { "content": fragment } }]
        });
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}
