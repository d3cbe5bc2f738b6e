//! Feature executors ("formulas")
//!
//! Every manifest section names a formula with its `formula` key. A formula
//! implements the [`Formula`] trait; the engine calls the lifecycle methods
//! with a [`FormulaContext`] carrying the feature's source (installed) and
//! target (desired) configuration.
//!
//! ## Adding a formula
//!
//! ```rust,ignore
//! #[derive(Debug, Default)]
//! pub struct Motd;
//!
//! impl Formula for Motd {
//!     fn kind(&self) -> &'static str {
//!         "motd"
//!     }
//!
//!     fn required_options(&self) -> &'static [&'static str] {
//!         &["text"]
//!     }
//!
//!     fn install(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
//!         let text = ctx.require("text")?;
//!         ctx.directory.add_to_rc(&format!("echo {text}"));
//!         base::install(ctx)
//!     }
//! }
//!
//! registry.register("motd", || Box::new(Motd));
//! ```
//!
//! Methods left at their defaults call into [`base`], which carries the
//! behavior shared by every formula (`rc` handling, the optional `command`
//! option, option validation and source-to-target carry-over).

pub mod base;
pub mod command;
pub mod env;
pub mod git;
pub mod link;
pub mod registry;
pub mod template;

use std::fmt;
use std::path::PathBuf;

use tracing::error;

pub use registry::FormulaRegistry;

use crate::environment::{Directory, System};
use crate::error::{self, Result};
use crate::manifest::FeatureConfig;

/// Everything a formula may touch while running one lifecycle phase
pub struct FormulaContext<'a> {
    /// Feature (section) name
    pub name: &'a str,
    /// Installed configuration, if the feature was installed before
    pub source: Option<&'a FeatureConfig>,
    /// Desired configuration, if the feature is still wanted
    pub target: Option<&'a FeatureConfig>,
    pub directory: &'a mut Directory,
    pub system: &'a System,
    errors: &'a mut Vec<String>,
}

impl fmt::Debug for FormulaContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormulaContext")
            .field("name", &self.name)
            .field("source", &self.source.is_some())
            .field("target", &self.target.is_some())
            .field("errors", &self.errors.len())
            .finish_non_exhaustive()
    }
}

impl<'a> FormulaContext<'a> {
    pub fn new(
        name: &'a str,
        source: Option<&'a FeatureConfig>,
        target: Option<&'a FeatureConfig>,
        directory: &'a mut Directory,
        system: &'a System,
        errors: &'a mut Vec<String>,
    ) -> Self {
        Self {
            name,
            source,
            target,
            directory,
            system,
            errors,
        }
    }

    /// The configuration that governs this run: target, else source
    pub fn config(&self) -> Option<&'a FeatureConfig> {
        self.target.or(self.source)
    }

    /// Substituted option value from the governing configuration
    pub fn option(&self, key: &str) -> Option<String> {
        self.config().and_then(|c| c.get(key).ok())
    }

    /// Substituted option value that must be present
    ///
    /// # Errors
    ///
    /// Returns `FormulaFailed` naming the missing option.
    pub fn require(&self, key: &str) -> Result<String> {
        self.option(key).ok_or_else(|| {
            error::feature::failed(self.name, format!("required option '{key}' is not set"))
        })
    }

    /// Record a feature error without aborting the current phase
    pub fn log_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!(feature = %self.name, "{message}");
        self.errors.push(message);
    }

    /// Install directory for this feature
    pub fn install_directory(&self) -> PathBuf {
        self.directory.install_directory(self.name)
    }

    /// Whether source and target resolve to different settings
    ///
    /// A feature without both sides always counts as changed.
    pub fn config_changed(&self) -> bool {
        match (self.source, self.target) {
            (Some(source), Some(target)) => source.to_dict() != target.to_dict(),
            _ => true,
        }
    }

    /// Whether `key` resolves differently between source and target
    pub fn option_changed(&self, key: &str) -> bool {
        let source = self.source.and_then(|c| c.get(key).ok());
        let target = self.target.and_then(|c| c.get(key).ok());
        source != target
    }
}

/// A strategy implementing one kind of feature
///
/// Lifecycle methods return errors for anything that should be recorded
/// against the feature; the engine never lets them escape to other
/// features.
pub trait Formula: fmt::Debug {
    /// Identifier used in the `formula` option
    fn kind(&self) -> &'static str;

    /// Options that must be present
    fn required_options(&self) -> &'static [&'static str] {
        &[]
    }

    /// Options understood beyond the required ones
    fn valid_options(&self) -> &'static [&'static str] {
        &[]
    }

    /// Options still accepted but scheduled for removal, with a hint
    fn deprecated_options(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// False when the feature's `systems` allow-list excludes this host
    fn should_run(&self, ctx: &FormulaContext<'_>) -> bool {
        base::should_run(ctx)
    }

    fn validate(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        base::validate(
            ctx,
            self.required_options(),
            self.valid_options(),
            self.deprecated_options(),
        );
        Ok(())
    }

    fn resolve(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        base::resolve(ctx);
        Ok(())
    }

    fn prompt(&mut self, _ctx: &mut FormulaContext<'_>) -> Result<()> {
        Ok(())
    }

    fn install(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        base::install(ctx)
    }

    fn update(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        base::update(ctx)
    }

    fn remove(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        base::remove(ctx)
    }

    fn activate(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        base::activate(ctx)
    }

    fn deactivate(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        base::deactivate(ctx)
    }
}
