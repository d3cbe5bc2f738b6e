//! Command implementations for Rigger CLI
//!
//! Each command opens an [`Environment`] through the shared
//! [`CommandContext`] and runs one driver operation on it.

pub mod completions;
pub mod install;
pub mod remove;
pub mod toggle;
pub mod update;
pub mod validate;

use std::path::PathBuf;
use std::rc::Rc;

use crate::engine::{CancellationToken, FeatureEngine};
use crate::environment::{self, Environment, EnvironmentBuilder, System};
use crate::error::{self, Result};
use crate::formula::FormulaRegistry;
use crate::ui::{InteractiveProgressReporter, Prompter, TerminalPrompter};

/// What every command needs to open an environment
#[derive(Debug)]
pub struct CommandContext {
    pub root: PathBuf,
    pub cancel: CancellationToken,
    pub prompter: Rc<dyn Prompter>,
}

impl CommandContext {
    /// Resolve the state root (`--root`, `RIGGER_ROOT`, else `~/.rigger`)
    ///
    /// # Errors
    ///
    /// Returns `IoError` when no root is given and there is no home
    /// directory.
    pub fn new(root: Option<PathBuf>, cancel: CancellationToken) -> Result<Self> {
        let root = root
            .or_else(environment::default_state_root)
            .ok_or_else(|| error::fs::io_error("Unable to determine home directory"))?;
        Ok(Self {
            root,
            cancel,
            prompter: Rc::new(TerminalPrompter),
        })
    }

    pub fn prompter(&self) -> Rc<dyn Prompter> {
        Rc::clone(&self.prompter)
    }

    /// Engine with the built-in formulas and a progress bar
    pub fn engine(&self) -> FeatureEngine {
        FeatureEngine::new(
            FormulaRegistry::with_builtins(),
            System::current(),
            self.cancel.clone(),
        )
        .with_reporter(Box::new(InteractiveProgressReporter::new()))
    }

    pub fn environment(&self, namespace: Option<String>) -> EnvironmentBuilder {
        Environment::builder(&self.root, self.prompter())
            .namespace(namespace)
            .engine(self.engine())
    }
}
