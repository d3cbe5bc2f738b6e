//! Common test utilities for Rigger integration tests

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Scratch HOME, state root and manifest directory for one test
pub struct TestWorkspace {
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Stand-in for `$HOME`
    pub home: PathBuf,
    /// `RIGGER_ROOT`
    pub root: PathBuf,
    /// Where test manifests are written
    pub manifests: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let home = temp.path().join("home");
        let root = temp.path().join("state");
        let manifests = temp.path().join("manifests");
        for dir in [&home, &manifests] {
            std::fs::create_dir_all(dir).expect("Failed to create directory");
        }
        Self {
            temp,
            home,
            root,
            manifests,
        }
    }

    /// Write a manifest and return its path as a CLI argument
    pub fn write_manifest(&self, name: &str, content: &str) -> String {
        let path = self.manifests.join(name);
        std::fs::write(&path, content).expect("Failed to write manifest");
        path.display().to_string()
    }

    /// Path inside the installed namespace
    #[allow(dead_code)]
    pub fn namespace_path(&self, namespace: &str, path: &str) -> PathBuf {
        self.root.join(namespace).join(path)
    }

    /// Read a file relative to the fake home, empty when missing
    #[allow(dead_code)]
    pub fn read_home(&self, path: &str) -> String {
        std::fs::read_to_string(self.home.join(path)).unwrap_or_default()
    }

    #[allow(dead_code)]
    pub fn read(&self, path: &Path) -> String {
        std::fs::read_to_string(path).expect("Failed to read file")
    }

    /// The rigger binary with HOME and RIGGER_ROOT pointed at this workspace
    pub fn cmd(&self) -> Command {
        let mut cmd = rigger_cmd();
        cmd.env("HOME", &self.home)
            .env("RIGGER_ROOT", &self.root)
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

// Temporary fix for deprecated cargo_bin - will be updated when build-dir issues are resolved
#[allow(deprecated)]
pub fn rigger_cmd() -> Command {
    Command::cargo_bin("rigger").expect("rigger binary not built")
}
