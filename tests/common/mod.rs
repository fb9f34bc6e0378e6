//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::Path;

use futures::StreamExt;
use git2::{Oid, Repository, Signature};
use taxis::context::Prompt;
use taxis::error::PromptError;
use taxis::llm::BatchStream;
use taxis::{CommitBatch, CommitProposal, CommitType, LlmError, ModelProvider, Prompter, Provider};

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository with a committer identity configured.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config.set_str("user.name", "Test User").expect("Failed to set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Failed to set user.email");
        }
        Self { dir, repo }
    }

    /// Create a repository with one initial commit of `files`, on `branch`.
    pub fn with_commit(branch: &str, files: &[(&str, &str)]) -> Self {
        let test_repo = Self::new();
        test_repo
            .repo
            .set_head(&format!("refs/heads/{branch}"))
            .expect("Failed to set HEAD");
        for (name, content) in files {
            test_repo.write(name, content);
        }
        test_repo.commit_all("initial commit");
        test_repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file in the working tree, creating parent directories.
    pub fn write(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(path, content).expect("Failed to write test file");
    }

    /// Add a file to the index.
    pub fn stage(&self, name: &str) {
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(name)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Stage everything in the working tree and commit it.
    pub fn commit_all(&self, message: &str) -> Oid {
        let mut index = self.repo.index().expect("Failed to get index");
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .expect("Failed to add files");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");
        let sig = Signature::now("Test User", "test@example.com").expect("Failed to create signature");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Number of commits reachable from HEAD.
    pub fn commit_count(&self) -> usize {
        let mut walk = self.repo.revwalk().expect("Failed to create revwalk");
        walk.push_head().expect("Failed to push HEAD");
        walk.count()
    }

    /// Full message of the HEAD commit.
    pub fn head_message(&self) -> String {
        self.repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map(|c| c.message().unwrap_or_default().to_string())
            .expect("Failed to read HEAD commit")
    }

    /// Paths touched by the HEAD commit relative to its parent.
    pub fn head_paths(&self) -> Vec<String> {
        let commit = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .expect("Failed to read HEAD commit");
        let tree = commit.tree().expect("Failed to read tree");
        let parent_tree = commit.parent(0).ok().and_then(|p| p.tree().ok());
        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
            .expect("Failed to diff");
        diff.deltas()
            .filter_map(|d| d.new_file().path().map(|p| p.to_string_lossy().into_owned()))
            .collect()
    }
}

/// Answers confirmations from a fixed script and records the questions.
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<bool>>,
    pub questions: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().copied().collect()),
            questions: RefCell::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> usize {
        self.questions.borrow().len()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, question: &str) -> Result<bool, PromptError> {
        self.questions.borrow_mut().push(question.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| PromptError::Interaction(format!("no scripted answer for {question:?}")))
    }
}

/// A model backend that replays fixed batches, optionally ending in an error.
pub struct FakeProvider {
    batches: Vec<CommitBatch>,
    fail_after: bool,
    pub prompts: RefCell<Vec<Prompt>>,
}

impl FakeProvider {
    pub fn new(batches: Vec<CommitBatch>) -> Self {
        Self {
            batches,
            fail_after: false,
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// Yield the batches, then a parse failure.
    pub fn failing_after(batches: Vec<CommitBatch>) -> Self {
        Self {
            fail_after: true,
            ..Self::new(batches)
        }
    }
}

impl ModelProvider for FakeProvider {
    fn provider(&self) -> Provider {
        Provider::Claude
    }

    fn stream_batches(&self, prompt: &Prompt) -> BatchStream {
        self.prompts.borrow_mut().push(prompt.clone());
        let mut items: Vec<Result<CommitBatch, LlmError>> =
            self.batches.iter().cloned().map(Ok).collect();
        if self.fail_after {
            items.push(Err(LlmError::ResponseParseFailed {
                provider: Provider::Claude,
                raw_output: "{\"commits\": [{\"type\": ".to_string(),
                parse_error: "element cut off by end of output".to_string(),
            }));
        }
        futures::stream::iter(items).boxed()
    }
}

/// Counts how often the pipeline asked for a model backend.
#[derive(Default)]
pub struct SelectionCounter(Cell<usize>);

impl SelectionCounter {
    pub fn hit(&self) {
        self.0.set(self.0.get() + 1);
    }

    pub fn count(&self) -> usize {
        self.0.get()
    }
}

pub fn proposal(commit_type: CommitType, description: &str, files: &[&str]) -> CommitProposal {
    CommitProposal {
        commit_type,
        scope: None,
        description: description.to_string(),
        breaking: false,
        body: None,
        footers: None,
        files: files.iter().map(|f| f.to_string()).collect(),
    }
}

pub fn batch(commits: Vec<CommitProposal>) -> CommitBatch {
    CommitBatch { commits }
}
