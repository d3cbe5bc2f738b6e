//! Best-effort rollback for fresh installs
//!
//! A fresh install creates the namespace directory and edits shell startup
//! files. If the run fails or is interrupted, everything it created is
//! deleted and every edited file gets its original content back.
//!
//! ## Usage
//!
//! ```ignore
//! let mut transaction = Transaction::new();
//! transaction.track_dir_created(directory.root());
//! transaction.backup_file(&bashrc)?;
//!
//! // Run features...
//!
//! // On success:
//! transaction.commit();
//!
//! // On error (automatic via Drop if not committed):
//! // rollback happens automatically
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{self, Result};

/// Original content of a file edited during the transaction
#[derive(Debug, Clone)]
struct FileBackup {
    path: PathBuf,
    /// `None` when the file did not exist
    content: Option<Vec<u8>>,
}

/// Tracks what a fresh install created so it can be undone
#[derive(Debug, Default)]
pub struct Transaction {
    /// Files edited during this transaction, with original content
    backups: Vec<FileBackup>,

    /// Directories created during this transaction, removed recursively
    created_dirs: HashSet<PathBuf>,

    committed: bool,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the current content of `path` before it is edited
    ///
    /// Backing up the same path twice keeps the first content.
    ///
    /// # Errors
    ///
    /// Returns `FileReadFailed` if an existing file cannot be read.
    pub fn backup_file(&mut self, path: &Path) -> Result<()> {
        if self.backups.iter().any(|b| b.path == path) {
            return Ok(());
        }
        let content = if path.exists() {
            Some(fs::read(path).map_err(|e| error::fs::read_failed(path, &e))?)
        } else {
            None
        };
        self.backups.push(FileBackup {
            path: path.to_path_buf(),
            content,
        });
        Ok(())
    }

    /// Track a directory that was created during this transaction
    pub fn track_dir_created(&mut self, path: impl Into<PathBuf>) {
        self.created_dirs.insert(path.into());
    }

    /// Commit the transaction (prevent rollback)
    pub fn commit(mut self) {
        self.committed = true;
    }

    /// Undo everything tracked so far
    ///
    /// Failures are logged and do not stop the remaining steps.
    pub fn rollback(&mut self) {
        if self.committed {
            return;
        }
        self.committed = true;
        info!("rolling back partial install");

        for backup in &self.backups {
            let result = match &backup.content {
                Some(content) => fs::write(&backup.path, content),
                None if backup.path.exists() => fs::remove_file(&backup.path),
                None => Ok(()),
            };
            if let Err(e) = result {
                warn!(path = %backup.path.display(), error = %e, "Failed to restore file");
            }
        }

        // Deepest first so nested tracked directories go before parents
        let mut dirs: Vec<_> = self.created_dirs.iter().collect();
        dirs.sort_by_key(|b| std::cmp::Reverse(b.components().count()));
        for path in dirs {
            if path.is_dir() {
                if let Err(e) = fs::remove_dir_all(path) {
                    warn!(path = %path.display(), error = %e, "Failed to remove directory");
                }
            }
        }
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.committed {
            self.rollback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_commit_keeps_changes() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("dev");
        fs::create_dir_all(&dir).unwrap();

        let mut transaction = Transaction::new();
        transaction.track_dir_created(&dir);
        transaction.commit();

        assert!(dir.exists());
    }

    #[test]
    fn test_drop_removes_created_dirs() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("dev");
        {
            let mut transaction = Transaction::new();
            fs::create_dir_all(dir.join("git/sub")).unwrap();
            fs::write(dir.join("git/sub/file"), "x").unwrap();
            transaction.track_dir_created(&dir);
        }
        assert!(!dir.exists());
        assert!(temp.path().exists());
    }

    #[test]
    fn test_rollback_restores_edited_files() {
        let temp = TempDir::new().unwrap();
        let bashrc = temp.path().join(".bashrc");
        let zshrc = temp.path().join(".zshrc");
        fs::write(&bashrc, "original\n").unwrap();

        let mut transaction = Transaction::new();
        transaction.backup_file(&bashrc).unwrap();
        transaction.backup_file(&zshrc).unwrap();
        fs::write(&bashrc, "original\nedited\n").unwrap();
        fs::write(&zshrc, "created\n").unwrap();
        transaction.backup_file(&bashrc).unwrap();

        transaction.rollback();
        assert_eq!(fs::read_to_string(&bashrc).unwrap(), "original\n");
        assert!(!zshrc.exists());
    }

    #[test]
    fn test_rollback_runs_once() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("dev");
        fs::create_dir_all(&dir).unwrap();

        let mut transaction = Transaction::new();
        transaction.track_dir_created(&dir);
        transaction.rollback();
        fs::create_dir_all(&dir).unwrap();
        drop(transaction);
        assert!(dir.exists());
    }
}
