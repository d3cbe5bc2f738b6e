//! Feature resolution engine
//!
//! Binds every feature of the source (installed) and target (desired)
//! manifests to one formula instance and drives them through the
//! lifecycle:
//!
//! ```text
//! should_run? --no--> skipped (left out of the run order)
//!     |
//!  validate -> resolve -> prompt -> sync
//! ```
//!
//! `sync` dispatches on which manifests declare the feature: target only
//! installs, source only removes, both updates. `activate` and
//! `deactivate` are requested explicitly by the driver.
//!
//! Errors are recorded against the feature that raised them and never stop
//! other features. A feature with errors from an earlier phase is skipped
//! in later phases unless the phase is forced.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use tracing::{debug, error, info};

use crate::environment::{Directory, System};
use crate::error::{Result, RiggerError};
use crate::formula::{Formula, FormulaContext, FormulaRegistry};
use crate::manifest::{FeatureConfig, Manifest};
use crate::ui::{ProgressReporter, SilentProgressReporter};

/// Set from the Ctrl-C handler; checked between features
pub type CancellationToken = Arc<AtomicBool>;

/// Fail with `Interrupted` once the token is set
///
/// # Errors
///
/// Returns `Interrupted` if cancellation was requested.
pub fn check_for_cancellation(token: &CancellationToken) -> Result<()> {
    if token.load(Ordering::SeqCst) {
        return Err(RiggerError::Interrupted);
    }
    Ok(())
}

/// Lifecycle step run across all features
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validate,
    Resolve,
    Prompt,
    /// install, update or remove depending on which manifests declare
    /// the feature
    Sync,
    Activate,
    Deactivate,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Validate => "validate",
            Phase::Resolve => "resolve",
            Phase::Prompt => "prompt",
            Phase::Sync => "sync",
            Phase::Activate => "activate",
            Phase::Deactivate => "deactivate",
        };
        f.write_str(name)
    }
}

/// One `(feature, kind)` binding with both of its configurations
#[derive(Debug)]
pub struct Feature {
    pub name: String,
    pub kind: String,
    formula: Option<Box<dyn Formula>>,
    pub source: Option<FeatureConfig>,
    pub target: Option<FeatureConfig>,
    pub errors: Vec<String>,
}

impl Feature {
    fn new(name: &str, kind: &str, registry: &FormulaRegistry) -> Self {
        let mut errors = Vec::new();
        let formula = if kind.is_empty() {
            errors.push(format!("feature {name} does not declare a formula"));
            None
        } else {
            match registry.create(kind) {
                Ok(formula) => Some(formula),
                Err(e) => {
                    errors.push(e.to_string());
                    None
                }
            }
        };
        for message in &errors {
            error!(feature = %name, "{message}");
        }
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            formula,
            source: None,
            target: None,
            errors,
        }
    }
}

type FeatureKey = (String, String);

pub struct FeatureEngine {
    registry: FormulaRegistry,
    system: System,
    features: IndexMap<FeatureKey, Feature>,
    run_order: Vec<FeatureKey>,
    cancel: CancellationToken,
    reporter: Box<dyn ProgressReporter>,
}

impl fmt::Debug for FeatureEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureEngine")
            .field("system", &self.system)
            .field("run_order", &self.run_order)
            .finish_non_exhaustive()
    }
}

impl FeatureEngine {
    pub fn new(registry: FormulaRegistry, system: System, cancel: CancellationToken) -> Self {
        Self {
            registry,
            system,
            features: IndexMap::new(),
            run_order: Vec::new(),
            cancel,
            reporter: Box::new(SilentProgressReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Box<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn system(&self) -> &System {
        &self.system
    }

    /// Bind the features of both manifests and compute the run order
    ///
    /// Target features come first in target dependency order; features
    /// only the source declares follow so that their removal still runs.
    /// A source-only binding that shares its name with a target feature of
    /// another kind runs right before it, so the old checkout is cleared
    /// before the new one is installed. Features excluded by `systems` are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Only `SectionNotFound` from an inconsistent manifest; unknown
    /// formula kinds are recorded as feature errors.
    pub fn build_run_order(
        &mut self,
        source: Option<&Manifest>,
        target: Option<&Manifest>,
        directory: &mut Directory,
    ) -> Result<()> {
        self.features.clear();
        self.run_order.clear();

        let mut target_keys = Vec::new();
        if let Some(target) = target {
            for name in target.formula_sections() {
                let config = target.get_feature_config(&name)?;
                let key = self.bind(&name, &config);
                if let Some(feature) = self.features.get_mut(&key) {
                    feature.target = Some(config);
                }
                target_keys.push(key);
            }
        }

        let mut source_only = Vec::new();
        if let Some(source) = source {
            for name in source.formula_sections() {
                let config = source.get_feature_config(&name)?;
                let key = self.bind(&name, &config);
                if let Some(feature) = self.features.get_mut(&key) {
                    feature.source = Some(config);
                }
                if !target_keys.contains(&key) {
                    source_only.push(key);
                }
            }
        }

        let mut order = Vec::new();
        for key in &target_keys {
            for replaced in source_only.iter().filter(|(name, _)| *name == key.0) {
                order.push(replaced.clone());
            }
            order.push(key.clone());
        }
        for key in source_only {
            if !order.contains(&key) {
                order.push(key);
            }
        }

        let system = &self.system;
        for key in order {
            let Some(feature) = self.features.get_mut(&key) else {
                continue;
            };
            let runs = match feature.formula.as_ref() {
                Some(formula) => {
                    let ctx = FormulaContext::new(
                        &feature.name,
                        feature.source.as_ref(),
                        feature.target.as_ref(),
                        directory,
                        system,
                        &mut feature.errors,
                    );
                    formula.should_run(&ctx)
                }
                None => true,
            };
            if runs {
                self.run_order.push(key);
            } else {
                info!(feature = %key.0, system = %system.family, "skipping feature for this system");
            }
        }

        debug!(order = ?self.run_order, "computed run order");
        Ok(())
    }

    fn bind(&mut self, name: &str, config: &FeatureConfig) -> FeatureKey {
        let kind = config.get_or("formula", "").trim().to_lowercase();
        let key = (name.to_string(), kind);
        if !self.features.contains_key(&key) {
            let feature = Feature::new(name, &key.1, &self.registry);
            self.features.insert(key.clone(), feature);
        }
        key
    }

    /// Run one phase over the run order
    ///
    /// # Errors
    ///
    /// Only `Interrupted`; every other failure is recorded on its feature.
    pub fn run_phase(&mut self, phase: Phase, directory: &mut Directory, force: bool) -> Result<()> {
        let total = self.run_order.len();
        let show_progress = matches!(phase, Phase::Sync | Phase::Activate | Phase::Deactivate);
        if show_progress {
            self.reporter.start(&phase.to_string(), total);
        }

        for (index, key) in self.run_order.iter().enumerate() {
            if let Err(e) = check_for_cancellation(&self.cancel) {
                self.reporter.abandon();
                return Err(e);
            }
            let Some(feature) = self.features.get_mut(key) else {
                continue;
            };
            if !feature.errors.is_empty() && !force {
                debug!(feature = %feature.name, phase = %phase, "skipping feature with errors");
                continue;
            }
            let Some(formula) = feature.formula.as_mut() else {
                continue;
            };
            if show_progress {
                self.reporter.feature(&feature.name, index + 1, total);
            }

            let mut ctx = FormulaContext::new(
                &feature.name,
                feature.source.as_ref(),
                feature.target.as_ref(),
                directory,
                &self.system,
                &mut feature.errors,
            );
            let result = match phase {
                Phase::Validate => formula.validate(&mut ctx),
                Phase::Resolve => formula.resolve(&mut ctx),
                Phase::Prompt => formula.prompt(&mut ctx),
                Phase::Sync => match (ctx.source.is_some(), ctx.target.is_some()) {
                    (false, true) => {
                        info!(feature = %ctx.name, "installing");
                        formula.install(&mut ctx)
                    }
                    (true, false) => {
                        info!(feature = %ctx.name, "removing");
                        formula.remove(&mut ctx)
                    }
                    (true, true) => {
                        info!(feature = %ctx.name, "updating");
                        formula.update(&mut ctx)
                    }
                    (false, false) => Ok(()),
                },
                Phase::Activate => formula.activate(&mut ctx),
                Phase::Deactivate => formula.deactivate(&mut ctx),
            };

            match result {
                Ok(()) => {}
                Err(RiggerError::Interrupted) => {
                    self.reporter.abandon();
                    return Err(RiggerError::Interrupted);
                }
                Err(e) => ctx.log_error(format!("{phase} failed: {e}")),
            }
            if show_progress {
                self.reporter.inc();
            }
        }

        if show_progress {
            self.reporter.finish();
        }
        Ok(())
    }

    /// Features in run order
    pub fn run_order(&self) -> Vec<&Feature> {
        self.run_order
            .iter()
            .filter_map(|key| self.features.get(key))
            .collect()
    }

    pub fn had_errors(&self) -> bool {
        self.run_order().iter().any(|f| !f.errors.is_empty())
    }

    /// Names of features that recorded errors
    pub fn failed_features(&self) -> Vec<String> {
        self.run_order()
            .into_iter()
            .filter(|f| !f.errors.is_empty())
            .map(|f| f.name.clone())
            .collect()
    }

    /// Every recorded error, grouped by feature, for the debug log
    pub fn error_report(&self) -> String {
        let mut out = String::new();
        for feature in self.run_order() {
            if feature.errors.is_empty() {
                continue;
            }
            out.push_str(&format!("[{}] ({})\n", feature.name, feature.kind));
            for message in &feature.errors {
                for line in message.lines() {
                    out.push_str("  ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        out
    }
}
