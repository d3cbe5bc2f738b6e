//! Staged edits to shell startup files
//!
//! Content is wrapped in namespace markers so that re-injecting replaces
//! the previous block instead of appending a duplicate:
//!
//! ```text
//! # >>> rigger:dev >>>
//! [ -d /home/me/.rigger/dev ] && . /home/me/.rigger/dev/.rc
//! # <<< rigger:dev <<<
//! ```
//!
//! Nothing touches disk until [`Injections::commit`].

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{self, Result};

/// Pending edits keyed by file
#[derive(Debug)]
pub struct Injections {
    namespace: String,
    /// `Some` injects the content, `None` clears the block
    pending: IndexMap<PathBuf, Option<String>>,
}

impl Injections {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            pending: IndexMap::new(),
        }
    }

    /// Stage `content` as this namespace's block in `path`
    pub fn inject(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.pending.insert(path.into(), Some(content.into()));
    }

    /// Stage removal of this namespace's block from `path`
    pub fn clear(&mut self, path: impl Into<PathBuf>) {
        self.pending.insert(path.into(), None);
    }

    #[cfg(test)]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Apply every staged edit and return the files that changed
    ///
    /// # Errors
    ///
    /// Returns `FileReadFailed`/`FileWriteFailed` on the first file that
    /// cannot be updated; edits to earlier files stay applied.
    pub fn commit(&mut self) -> Result<Vec<PathBuf>> {
        let mut changed = Vec::new();
        for (path, content) in std::mem::take(&mut self.pending) {
            if self.apply(&path, content.as_deref())? {
                changed.push(path);
            }
        }
        Ok(changed)
    }

    fn apply(&self, path: &Path, content: Option<&str>) -> Result<bool> {
        let existing = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if content.is_none() {
                    return Ok(false);
                }
                String::new()
            }
            Err(e) => return Err(error::fs::read_failed(path, &e)),
        };

        let updated = self.rewrite(&existing, content);
        if updated == existing {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| error::fs::write_failed(parent, &e))?;
        }
        fs::write(path, &updated).map_err(|e| error::fs::write_failed(path, &e))?;
        debug!(path = %path.display(), "updated injected block");
        Ok(true)
    }

    fn start_marker(&self) -> String {
        format!("# >>> rigger:{} >>>", self.namespace)
    }

    fn end_marker(&self) -> String {
        format!("# <<< rigger:{} <<<", self.namespace)
    }

    /// Drop any existing block, then append the new one if given
    fn rewrite(&self, text: &str, content: Option<&str>) -> String {
        let start = self.start_marker();
        let end = self.end_marker();

        let mut kept: Vec<&str> = Vec::new();
        let mut inside = false;
        for line in text.lines() {
            if line.trim() == start {
                inside = true;
            } else if inside && line.trim() == end {
                inside = false;
            } else if !inside {
                kept.push(line);
            }
        }

        let mut out = kept.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        if let Some(content) = content {
            out.push_str(&start);
            out.push('\n');
            let body = content.trim_end();
            if !body.is_empty() {
                out.push_str(body);
                out.push('\n');
            }
            out.push_str(&end);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_inject_creates_file() {
        let temp = TempDir::new().unwrap();
        let rc = temp.path().join(".bashrc");
        let mut injections = Injections::new("dev");
        injections.inject(&rc, "source dev");

        let changed = injections.commit().unwrap();
        assert_eq!(changed, vec![rc.clone()]);
        assert_eq!(
            fs::read_to_string(&rc).unwrap(),
            "# >>> rigger:dev >>>\nsource dev\n# <<< rigger:dev <<<\n"
        );
        assert!(!injections.has_pending());
    }

    #[test]
    fn test_reinject_replaces_block() {
        let temp = TempDir::new().unwrap();
        let rc = temp.path().join(".bashrc");
        fs::write(&rc, "alias ll='ls -l'\n").unwrap();

        let mut injections = Injections::new("dev");
        injections.inject(&rc, "first");
        injections.commit().unwrap();
        injections.inject(&rc, "second");
        injections.commit().unwrap();

        let text = fs::read_to_string(&rc).unwrap();
        assert_eq!(text.matches("# >>> rigger:dev >>>").count(), 1);
        assert!(text.starts_with("alias ll='ls -l'\n"));
        assert!(text.contains("second"));
        assert!(!text.contains("first"));
    }

    #[test]
    fn test_unchanged_file_not_rewritten() {
        let temp = TempDir::new().unwrap();
        let rc = temp.path().join(".bashrc");
        let mut injections = Injections::new("dev");
        injections.inject(&rc, "line");
        injections.commit().unwrap();
        injections.inject(&rc, "line");
        assert!(injections.commit().unwrap().is_empty());
    }

    #[test]
    fn test_clear_removes_only_own_block() {
        let temp = TempDir::new().unwrap();
        let rc = temp.path().join(".bashrc");
        let mut dev = Injections::new("dev");
        let mut work = Injections::new("work");
        dev.inject(&rc, "dev line");
        dev.commit().unwrap();
        work.inject(&rc, "work line");
        work.commit().unwrap();

        dev.clear(&rc);
        dev.commit().unwrap();
        let text = fs::read_to_string(&rc).unwrap();
        assert!(!text.contains("dev line"));
        assert!(text.contains("work line"));
    }

    #[test]
    fn test_clear_missing_file_is_noop() {
        let temp = TempDir::new().unwrap();
        let rc = temp.path().join(".zshrc");
        let mut injections = Injections::new("dev");
        injections.clear(&rc);
        assert!(injections.commit().unwrap().is_empty());
        assert!(!rc.exists());
    }

    #[test]
    fn test_staged_edits_not_written_before_commit() {
        let temp = TempDir::new().unwrap();
        let rc = temp.path().join(".bashrc");
        let mut injections = Injections::new("dev");
        injections.inject(&rc, "line");
        assert!(!rc.exists());
        assert!(injections.has_pending());
    }
}
