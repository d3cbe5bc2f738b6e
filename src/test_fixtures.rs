//! Test fixtures shared by unit tests
//!
//! ```ignore
//! use crate::test_fixtures::{FormulaHarness, ScriptedPrompter};
//!
//! #[test]
//! fn my_test() {
//!     // One feature with only a desired configuration
//!     let mut harness = FormulaHarness::target_only("[a]\nformula = env\nx = 1\n", "a");
//!     EnvFormula.install(&mut harness.context()).unwrap();
//!
//!     // Prompts answered from a script
//!     let prompter = ScriptedPrompter::new(&[("user", "me")]);
//! }
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use tempfile::TempDir;

use crate::environment::{Directory, OsFamily, System};
use crate::error::{self, Result};
use crate::formula::FormulaContext;
use crate::manifest::{FeatureConfig, Manifest};
use crate::ui::Prompter;

/// Create a temp directory in the system temp location.
///
/// # Panics
///
/// Panics if the temp directory cannot be created.
#[must_use]
pub fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Create a git repository with one commit holding `file`.
///
/// Returns the `TempDir` (which cleans up on drop) and the clone URL.
///
/// # Panics
///
/// Panics if the repository or commit cannot be created.
#[must_use]
pub fn create_git_repo_with_commit(file: &str, content: &str) -> (TempDir, String) {
    let temp = create_temp_dir();
    let repo = git2::Repository::init(temp.path()).expect("Failed to init git repository");
    commit_file(&repo, temp.path(), file, content);
    let url = temp.path().display().to_string();
    (temp, url)
}

/// Write `file` in the work tree and commit it on the current branch.
///
/// # Panics
///
/// Panics if any git step fails.
pub fn commit_file(repo: &git2::Repository, workdir: &Path, file: &str, content: &str) {
    std::fs::write(workdir.join(file), content).expect("Failed to write file");
    let mut index = repo.index().expect("Failed to open index");
    index.add_path(Path::new(file)).expect("Failed to stage file");
    index.write().expect("Failed to write index");
    let tree_id = index.write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_id).expect("Failed to find tree");
    let signature = git2::Signature::now("Test", "test@example.com").expect("Bad signature");
    let parent = repo
        .head()
        .ok()
        .and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &signature, &signature, "commit", &tree, &parents)
        .expect("Failed to commit");
}

/// Prompter answering from a fixed script
///
/// Unscripted questions take the offered default, or fail with
/// `InputRequired` like a non-interactive terminal.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: HashMap<String, String>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[(&str, &str)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(name, answer)| (name.to_string(), answer.to_string()))
                .collect(),
            asked: RefCell::new(Vec::new()),
        }
    }

    /// Names asked for so far, in order
    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }

    fn answer(&self, name: &str, default: Option<&str>) -> Result<String> {
        self.asked.borrow_mut().push(name.to_string());
        self.answers
            .get(name)
            .cloned()
            .or_else(|| default.map(str::to_string))
            .ok_or_else(|| error::input::required(name))
    }
}

impl Prompter for ScriptedPrompter {
    fn text(&self, name: &str, _message: &str, default: Option<&str>) -> Result<String> {
        self.answer(name, default)
    }

    fn secret(&self, name: &str, _message: &str, default: Option<&str>) -> Result<String> {
        self.answer(name, default)
    }
}

/// One feature's source/target configs plus a scratch namespace directory
pub struct FormulaHarness {
    pub temp: TempDir,
    pub name: String,
    pub source: Option<FeatureConfig>,
    pub target: Option<FeatureConfig>,
    pub directory: Directory,
    pub system: System,
    pub errors: Vec<String>,
}

impl FormulaHarness {
    fn empty(name: &str) -> Self {
        let temp = create_temp_dir();
        let directory = Directory::new(temp.path().join("ns"));
        directory.initialize().expect("Failed to initialize namespace");
        Self {
            temp,
            name: name.to_string(),
            source: None,
            target: None,
            directory,
            system: System::with_family(OsFamily::current()),
            errors: Vec::new(),
        }
    }

    /// Feature declared only by the desired manifest (install)
    pub fn target_only(text: &str, name: &str) -> Self {
        let mut harness = Self::empty(name);
        harness.set_target(text);
        harness
    }

    /// Feature declared only by the installed manifest (remove)
    pub fn source_only(text: &str, name: &str) -> Self {
        let mut harness = Self::empty(name);
        harness.set_source(text);
        harness
    }

    /// Feature declared by both manifests (update)
    pub fn pair(source: &str, target: &str, name: &str) -> Self {
        let mut harness = Self::empty(name);
        harness.set_pair(source, target);
        harness
    }

    /// Replace both sides with a target-only configuration
    pub fn set_target(&mut self, text: &str) {
        self.source = None;
        self.target = self.config(text);
    }

    /// Replace both sides with a source-only configuration
    pub fn set_source(&mut self, text: &str) {
        self.source = self.config(text);
        self.target = None;
    }

    pub fn set_pair(&mut self, source: &str, target: &str) {
        self.source = self.config(source);
        self.target = self.config(target);
    }

    fn config(&self, text: &str) -> Option<FeatureConfig> {
        let manifest = Manifest::parse(text, Rc::new(ScriptedPrompter::default()))
            .expect("Failed to parse manifest");
        manifest.get_feature_config(&self.name).ok()
    }

    pub fn context(&mut self) -> FormulaContext<'_> {
        FormulaContext::new(
            &self.name,
            self.source.as_ref(),
            self.target.as_ref(),
            &mut self.directory,
            &self.system,
            &mut self.errors,
        )
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_create_git_repo_with_commit() {
        let (temp, url) = create_git_repo_with_commit("README.md", "hi");
        let repo = git2::Repository::open(&url).unwrap();
        assert!(repo.head().unwrap().peel_to_commit().is_ok());
        assert!(temp.path().join("README.md").exists());
    }

    #[test]
    fn test_scripted_prompter_records_questions() {
        let prompter = ScriptedPrompter::new(&[("user", "me")]);
        assert_eq!(prompter.text("user", "User", None).unwrap(), "me");
        assert_eq!(prompter.secret("pass", "Pass", Some("x")).unwrap(), "x");
        assert!(prompter.text("other", "Other", None).is_err());
        assert_eq!(prompter.asked(), vec!["user", "pass", "other"]);
    }

    #[test]
    fn test_harness_sides() {
        let harness = FormulaHarness::pair("[a]\nx = 1\n", "[b]\n", "a");
        assert!(harness.source.is_some());
        assert!(harness.target.is_none());
        assert!(harness.directory.bin_dir().is_dir());
    }
}
