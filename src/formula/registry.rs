//! Formula lookup by kind
//!
//! The registry maps the `formula` option of a section to a factory that
//! builds a fresh executor. Each feature gets its own instance, so
//! formulas may keep per-feature state between lifecycle phases.
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = FormulaRegistry::with_builtins();
//! let mut formula = registry.create("git")?;
//! assert_eq!(formula.kind(), "git");
//! ```

use std::collections::HashMap;

use tracing::debug;

use super::Formula;
use super::command::CommandFormula;
use super::env::EnvFormula;
use super::git::GitFormula;
use super::link::LinkFormula;
use super::template::TemplateFormula;
use crate::error::{self, Result};

/// Builds one executor instance
pub type FormulaFactory = fn() -> Box<dyn Formula>;

/// Registry of formula factories keyed by kind
#[derive(Debug, Default)]
pub struct FormulaRegistry {
    factories: HashMap<String, FormulaFactory>,
}

impl FormulaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every built-in formula
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtins();
        registry
    }

    /// Register a factory under `kind`
    ///
    /// A later registration for the same kind replaces the earlier one and
    /// the replaced factory is returned.
    pub fn register(&mut self, kind: &str, factory: FormulaFactory) -> Option<FormulaFactory> {
        debug!(kind = %kind, "registering formula");
        self.factories.insert(kind.to_lowercase(), factory)
    }

    /// Register the built-in formulas:
    /// - command
    /// - env
    /// - git
    /// - link
    /// - template
    pub fn register_builtins(&mut self) {
        macro_rules! register_formulas {
            ($($kind:literal => $formula:ty),* $(,)?) => {
                $(self.register($kind, || Box::new(<$formula>::default()));)*
            };
        }

        register_formulas![
            "command" => CommandFormula,
            "env" => EnvFormula,
            "git" => GitFormula,
            "link" => LinkFormula,
            "template" => TemplateFormula,
        ];
    }

    /// Build an executor for `kind`
    ///
    /// # Errors
    ///
    /// Returns `UnknownFormula` if nothing is registered under `kind`.
    pub fn create(&self, kind: &str) -> Result<Box<dyn Formula>> {
        self.factories
            .get(&kind.trim().to_lowercase())
            .map(|factory| factory())
            .ok_or_else(|| error::feature::unknown_formula(kind))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(&kind.trim().to_lowercase())
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}
