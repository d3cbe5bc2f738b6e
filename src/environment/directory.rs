//! Namespace directory layout
//!
//! ```text
//! <root>/<namespace>/
//! ├── manifest.cfg      installed manifest
//! ├── .rc               sourced by the user's shell
//! ├── bin/              symlinked executables
//! ├── lib/              symlinked libraries
//! └── <feature>/        one install directory per feature
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{self, Result};

const MANIFEST_FILE: &str = "manifest.cfg";
const RC_FILE: &str = ".rc";
const BIN_DIR: &str = "bin";
const LIB_DIR: &str = "lib";

/// Where a symlink is placed inside the namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDest {
    Bin,
    Lib,
}

impl LinkDest {
    /// Parse a `dest` option value
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "bin" => Some(Self::Bin),
            "lib" => Some(Self::Lib),
            _ => None,
        }
    }
}

/// On-disk state of one namespace
#[derive(Debug)]
pub struct Directory {
    root: PathBuf,
    /// When false, `finalize` leaves the existing `.rc` untouched
    pub rewrite_rc: bool,
    rc_fragments: Vec<String>,
}

impl Directory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            rewrite_rc: true,
            rc_fragments: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn rc_path(&self) -> PathBuf {
        self.root.join(RC_FILE)
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join(BIN_DIR)
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.root.join(LIB_DIR)
    }

    /// Install directory of a feature
    ///
    /// Path separators in feature names are flattened.
    pub fn install_directory(&self, feature: &str) -> PathBuf {
        self.root.join(feature.replace(['/', '\\'], "_"))
    }

    /// Create the namespace root with `bin/` and `lib/`
    ///
    /// # Errors
    ///
    /// Returns `FileWriteFailed` if a directory cannot be created.
    pub fn initialize(&self) -> Result<()> {
        for dir in [self.root.clone(), self.bin_dir(), self.lib_dir()] {
            fs::create_dir_all(&dir).map_err(|e| error::fs::write_failed(&dir, &e))?;
        }
        Ok(())
    }

    /// Queue shell content for the namespace `.rc`
    pub fn add_to_rc(&mut self, content: &str) {
        let content = content.trim();
        if !content.is_empty() {
            self.rc_fragments.push(content.to_string());
        }
    }

    /// Full `.rc` text: search paths first, then every queued fragment
    pub fn rc_contents(&self) -> String {
        let mut out = format!(
            "export PATH=\"{}:$PATH\"\nexport LD_LIBRARY_PATH=\"{}:$LD_LIBRARY_PATH\"\n",
            self.bin_dir().display(),
            self.lib_dir().display()
        );
        for fragment in &self.rc_fragments {
            out.push_str(fragment);
            out.push('\n');
        }
        out
    }

    /// Write the `.rc` file unless rewriting is disabled
    ///
    /// # Errors
    ///
    /// Returns `FileWriteFailed` if the file cannot be written.
    pub fn finalize(&self) -> Result<()> {
        if !self.rewrite_rc {
            debug!("rc rewriting disabled, leaving .rc untouched");
            return Ok(());
        }
        let path = self.rc_path();
        fs::write(&path, self.rc_contents()).map_err(|e| error::fs::write_failed(&path, &e))
    }

    /// Symlink `target` as `name` under `bin/` or `lib/`, replacing any
    /// existing entry
    ///
    /// # Errors
    ///
    /// Returns `FileWriteFailed` if the link cannot be created.
    pub fn symlink(&self, dest: LinkDest, name: &str, target: &Path) -> Result<PathBuf> {
        let dir = match dest {
            LinkDest::Bin => self.bin_dir(),
            LinkDest::Lib => self.lib_dir(),
        };
        fs::create_dir_all(&dir).map_err(|e| error::fs::write_failed(&dir, &e))?;
        let link = dir.join(name);
        if link.symlink_metadata().is_ok() {
            fs::remove_file(&link).map_err(|e| error::fs::write_failed(&link, &e))?;
        }
        create_symlink(target, &link).map_err(|e| error::fs::write_failed(&link, &e))?;
        debug!(link = %link.display(), target = %target.display(), "created symlink");
        Ok(link)
    }

    /// Remove a symlink created by [`Directory::symlink`]
    ///
    /// # Errors
    ///
    /// Returns `FileWriteFailed` if an existing link cannot be removed.
    pub fn unlink(&self, dest: LinkDest, name: &str) -> Result<()> {
        let link = match dest {
            LinkDest::Bin => self.bin_dir(),
            LinkDest::Lib => self.lib_dir(),
        }
        .join(name);
        if link.symlink_metadata().is_ok() {
            fs::remove_file(&link).map_err(|e| error::fs::write_failed(&link, &e))?;
        }
        Ok(())
    }

    /// Delete a feature's install directory
    ///
    /// # Errors
    ///
    /// Returns `FileWriteFailed` if the directory cannot be removed.
    pub fn remove_feature(&self, feature: &str) -> Result<()> {
        let dir = self.install_directory(feature);
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|e| error::fs::write_failed(&dir, &e))?;
        }
        Ok(())
    }

    /// Delete the whole namespace tree
    ///
    /// # Errors
    ///
    /// Returns `FileWriteFailed` if the tree cannot be removed.
    pub fn remove(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root).map_err(|e| error::fs::write_failed(&self.root, &e))?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}
