//! Reconciliation driver
//!
//! An [`Environment`] owns one namespace: its installed (source) manifest,
//! an optional desired (target) manifest, the on-disk [`Directory`] and the
//! staged shell startup edits. It is opened with
//! [`EnvironmentBuilder::warmup`], which resolves the namespace and loads
//! the installed manifest, and then runs one operation:
//!
//! - `install`: fresh namespace, rolled back if anything fails
//! - `update`: reconcile an installed namespace with the target
//! - `remove`: run every feature's removal, then delete the namespace
//! - `activate` / `deactivate`: toggle the shell hooks and `.rc`
//! - `validate`: report configuration errors without touching disk

mod directory;
mod injections;
mod system;

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, error, info, warn};

pub use directory::{Directory, LinkDest};
pub use injections::Injections;
pub use system::System;
#[cfg(test)]
pub use system::OsFamily;

use crate::engine::{CancellationToken, FeatureEngine, Phase};
use crate::error::{self, Result, RiggerError};
use crate::formula::FormulaRegistry;
use crate::manifest::{CONFIG_SECTION, LoadOptions, Manifest, template};
use crate::transaction::Transaction;
use crate::ui::{self, Prompter};

/// Shell startup files that always receive the hook
const ALWAYS_HOOKED: &[&str] = &[".bashrc"];

/// Shell startup files hooked only when they already exist
const HOOKED_IF_PRESENT: &[&str] = &[".zshrc", ".bash_profile"];

const LOG_DIR: &str = "logs";

/// `[config]` keys that identify a manifest and are never carried over
const IDENTITY_KEYS: &[&str] = &["namespace", "source", "extends"];

/// Collects what an [`Environment`] needs before it can be opened
pub struct EnvironmentBuilder {
    state_root: PathBuf,
    home: Option<PathBuf>,
    namespace: Option<String>,
    source: Option<Manifest>,
    target: Option<Manifest>,
    engine: Option<FeatureEngine>,
    prompter: Rc<dyn Prompter>,
}

impl EnvironmentBuilder {
    /// Home directory holding the shell startup files
    #[cfg(test)]
    pub fn home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Namespace that wins over the manifests' own
    pub fn namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    /// Desired state
    pub fn target(mut self, target: Manifest) -> Self {
        self.target = Some(target);
        self
    }

    /// Installed state; loaded from the namespace directory when not given
    #[cfg(test)]
    pub fn source(mut self, source: Manifest) -> Self {
        self.source = Some(source);
        self
    }

    pub fn engine(mut self, engine: FeatureEngine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Resolve the namespace and load the installed manifest
    ///
    /// The namespace comes from the explicit value, then the target
    /// manifest, then the source manifest.
    ///
    /// # Errors
    ///
    /// `NamespaceUnresolved` when no namespace can be found, or any error
    /// loading the installed manifest.
    pub fn warmup(self) -> Result<Environment> {
        let namespace = self
            .namespace
            .clone()
            .or_else(|| self.target.as_ref().and_then(Manifest::namespace))
            .or_else(|| self.source.as_ref().and_then(Manifest::namespace))
            .ok_or(RiggerError::NamespaceUnresolved)?;
        debug!(namespace = %namespace, "warming up environment");

        if let Some(target) = &self.target {
            target.set_namespace(namespace.clone());
        }

        let directory = Directory::new(self.state_root.join(&namespace));
        let source = match self.source {
            Some(source) => Some(source),
            None if directory.manifest_path().is_file() => {
                let options = LoadOptions {
                    namespace: Some(namespace.clone()),
                    do_inherit: false,
                    ..LoadOptions::default()
                };
                let path = directory.manifest_path().display().to_string();
                Some(Manifest::load(&path, &options, Rc::clone(&self.prompter))?)
            }
            None => None,
        };

        let engine = self.engine.unwrap_or_else(|| {
            FeatureEngine::new(
                FormulaRegistry::with_builtins(),
                System::current(),
                CancellationToken::default(),
            )
        });

        Ok(Environment {
            home: self.home.or_else(dirs::home_dir),
            state_root: self.state_root,
            injections: Injections::new(namespace.clone()),
            namespace,
            source,
            target: self.target,
            directory,
            engine,
            prompter: self.prompter,
        })
    }
}

/// One namespace being reconciled
pub struct Environment {
    state_root: PathBuf,
    home: Option<PathBuf>,
    namespace: String,
    source: Option<Manifest>,
    target: Option<Manifest>,
    directory: Directory,
    injections: Injections,
    engine: FeatureEngine,
    prompter: Rc<dyn Prompter>,
}

impl Environment {
    pub fn builder(state_root: impl Into<PathBuf>, prompter: Rc<dyn Prompter>) -> EnvironmentBuilder {
        EnvironmentBuilder {
            state_root: state_root.into(),
            home: None,
            namespace: None,
            source: None,
            target: None,
            engine: None,
            prompter,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[cfg(test)]
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    #[cfg(test)]
    pub fn engine(&self) -> &FeatureEngine {
        &self.engine
    }

    pub fn is_installed(&self) -> bool {
        self.directory.exists()
    }

    /// Install the target into a fresh namespace
    ///
    /// An existing namespace is updated instead. A failed or interrupted
    /// install removes the namespace directory and restores the shell
    /// startup files.
    ///
    /// # Errors
    ///
    /// `ManifestRequired` without a target, `FeatureErrors` when any
    /// feature failed, or the first fatal error.
    pub fn install(&mut self) -> Result<()> {
        if self.directory.exists() {
            info!(namespace = %self.namespace, "namespace already installed, updating");
            return self.update(false);
        }
        if self.target.is_none() {
            return Err(error::environment::manifest_required(&self.namespace));
        }

        let mut transaction = Transaction::new();
        transaction.track_dir_created(self.directory.root());
        for rc in self.rc_files() {
            transaction.backup_file(&rc)?;
        }

        self.directory.initialize()?;
        self.run_features(false)?;
        self.inject_rc_hooks();
        self.finalize(true)?;

        transaction.commit();
        Ok(())
    }

    /// Reconcile the installed namespace with the target
    ///
    /// Without a target, the manifest is reloaded from the installed
    /// `config.source`, falling back to the installed copy. `reconfigure`
    /// asks every input again and skips carrying values over from the
    /// installed manifest.
    ///
    /// # Errors
    ///
    /// `NotInstalled`, `FeatureErrors`, or the first fatal error.
    pub fn update(&mut self, reconfigure: bool) -> Result<()> {
        let installed = self.installed()?;
        if self.target.is_none() {
            self.target = Some(self.reload_target(&installed)?);
        }

        self.directory.initialize()?;
        self.run_features(reconfigure)?;
        self.inject_rc_hooks();
        self.finalize(true)
    }

    /// Remove every feature, the shell hooks and the namespace directory
    ///
    /// Removal runs for features with earlier errors too.
    ///
    /// # Errors
    ///
    /// `NotInstalled`, `FeatureErrors`, or the first fatal error.
    pub fn remove(&mut self) -> Result<()> {
        let installed = self.installed()?;
        self.target = None;
        self.add_context();

        self.engine
            .build_run_order(Some(&installed), None, &mut self.directory)?;
        self.engine.run_phase(Phase::Sync, &mut self.directory, true)?;

        self.clear_rc_hooks();
        self.injections.commit()?;
        self.directory.remove()?;
        info!(namespace = %self.namespace, "removed namespace");
        self.report()
    }

    /// Rewrite `.rc` from the installed features and hook it into the shell
    ///
    /// # Errors
    ///
    /// `NotInstalled`, `FeatureErrors`, or the first fatal error.
    pub fn activate(&mut self) -> Result<()> {
        let installed = self.installed()?;
        self.add_context();

        self.engine
            .build_run_order(Some(&installed), None, &mut self.directory)?;
        self.engine.run_phase(Phase::Activate, &mut self.directory, false)?;

        self.inject_rc_hooks();
        self.finalize(false)
    }

    /// Unhook the namespace from the shell, leaving installed content alone
    ///
    /// # Errors
    ///
    /// `NotInstalled`, `FeatureErrors`, or the first fatal error.
    pub fn deactivate(&mut self) -> Result<()> {
        let installed = self.installed()?;
        self.directory.rewrite_rc = false;
        self.add_context();

        self.engine
            .build_run_order(Some(&installed), None, &mut self.directory)?;
        self.engine
            .run_phase(Phase::Deactivate, &mut self.directory, false)?;

        self.clear_rc_hooks();
        self.finalize(false)
    }

    /// Run only the validate phase
    ///
    /// # Errors
    ///
    /// `FeatureErrors` listing every feature with configuration errors.
    pub fn validate(&mut self) -> Result<()> {
        self.add_context();
        self.engine.build_run_order(
            self.source.as_ref(),
            self.target.as_ref(),
            &mut self.directory,
        )?;
        self.engine
            .run_phase(Phase::Validate, &mut self.directory, false)?;

        if self.engine.had_errors() {
            return Err(error::feature::aggregate(&self.engine.failed_features()));
        }
        Ok(())
    }

    /// Validate, resolve, prompt and sync every feature
    fn run_features(&mut self, reconfigure: bool) -> Result<()> {
        if let (Some(source), Some(target), false) = (&self.source, &self.target, reconfigure) {
            carry_over_config(source, target);
        }
        if let Some(target) = &self.target {
            target.resolve_unset_inputs(reconfigure)?;
        }
        self.add_context();

        self.engine.build_run_order(
            self.source.as_ref(),
            self.target.as_ref(),
            &mut self.directory,
        )?;

        let phases: &[Phase] = if reconfigure {
            &[Phase::Validate, Phase::Prompt, Phase::Sync]
        } else {
            &[Phase::Validate, Phase::Resolve, Phase::Prompt, Phase::Sync]
        };
        for phase in phases {
            debug!(phase = %phase, "running phase");
            self.engine.run_phase(*phase, &mut self.directory, false)?;
        }
        Ok(())
    }

    /// Expose install paths and the host name to substitutions
    fn add_context(&self) {
        let root = self.directory.root().display().to_string();
        let node = self.engine.system().hostname.clone();

        for manifest in [self.source.as_ref(), self.target.as_ref()].into_iter().flatten() {
            let mut entries: Vec<(String, String)> = manifest
                .formula_sections()
                .into_iter()
                .map(|section| {
                    let dir = self.directory.install_directory(&section);
                    (format!("{section}:root_dir"), dir.display().to_string())
                })
                .collect();
            entries.push((format!("{CONFIG_SECTION}:root_dir"), root.clone()));
            entries.push((format!("{CONFIG_SECTION}:node"), node.clone()));
            manifest.add_additional_context(entries);
        }
    }

    fn installed(&self) -> Result<Manifest> {
        if !self.directory.exists() {
            return Err(error::environment::not_installed(&self.namespace));
        }
        self.source
            .clone()
            .ok_or_else(|| error::environment::not_installed(&self.namespace))
    }

    fn reload_target(&self, installed: &Manifest) -> Result<Manifest> {
        if let Some(location) = installed.source() {
            let options = LoadOptions {
                namespace: Some(self.namespace.clone()),
                ..LoadOptions::default()
            };
            match Manifest::load(&location, &options, Rc::clone(&self.prompter)) {
                Ok(manifest) => {
                    info!(source = %location, "reloaded manifest from its source");
                    return Ok(manifest);
                }
                Err(e) => {
                    warn!(source = %location, error = %e, "Unable to reload manifest, using installed copy");
                }
            }
        }
        let copy = Manifest::parse(&installed.render(), Rc::clone(&self.prompter))?;
        copy.set_namespace(self.namespace.clone());
        Ok(copy)
    }

    /// Shell startup files that receive the hook
    fn rc_files(&self) -> Vec<PathBuf> {
        let Some(home) = &self.home else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = ALWAYS_HOOKED.iter().map(|name| home.join(name)).collect();
        files.extend(
            HOOKED_IF_PRESENT
                .iter()
                .map(|name| home.join(name))
                .filter(|path| path.exists()),
        );
        files
    }

    fn rc_hook(&self) -> String {
        let root = template::escape(&self.directory.root().display().to_string());
        let rc = template::escape(&self.directory.rc_path().display().to_string());
        format!("[ -d {root} ] && . {rc}")
    }

    fn inject_rc_hooks(&mut self) {
        let hook = self.rc_hook();
        for rc in self.rc_files() {
            self.injections.inject(rc, hook.clone());
        }
    }

    fn clear_rc_hooks(&mut self) {
        let Some(home) = self.home.clone() else {
            return;
        };
        for name in ALWAYS_HOOKED.iter().chain(HOOKED_IF_PRESENT) {
            self.injections.clear(home.join(name));
        }
    }

    /// Flush `.rc`, shell hooks and the manifest, then report the outcome
    fn finalize(&mut self, persist_manifest: bool) -> Result<()> {
        self.directory.finalize()?;
        for path in self.injections.commit()? {
            info!(path = %path.display(), "updated shell startup file");
        }
        if persist_manifest {
            if let Some(target) = &self.target {
                target.write_to_path(&self.directory.manifest_path())?;
            }
        }
        self.report()
    }

    /// Print the manifest's closing message and fail when features failed
    fn report(&self) -> Result<()> {
        let manifest = self.target.as_ref().or(self.source.as_ref());
        let message = |key: &str| manifest.and_then(|m| m.config().get(key).ok());

        if self.engine.had_errors() {
            match self.write_debug_log() {
                Ok(path) => error!(log = %path.display(), "Errors occurred, details written to log"),
                Err(e) => warn!(error = %e, "Unable to write debug log"),
            }
            if let Some(text) = message("message_failure") {
                ui::message(&text, true);
            }
            return Err(error::feature::aggregate(&self.engine.failed_features()));
        }

        if let Some(text) = message("message_success") {
            ui::message(&text, false);
        }
        Ok(())
    }

    /// Write every feature error to `<root>/logs/<namespace>-<secs>.log`
    fn write_debug_log(&self) -> Result<PathBuf> {
        let dir = self.state_root.join(LOG_DIR);
        fs::create_dir_all(&dir).map_err(|e| error::fs::write_failed(&dir, &e))?;
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let path = dir.join(format!("{}-{secs}.log", self.namespace));
        fs::write(&path, self.engine.error_report())
            .map_err(|e| error::fs::write_failed(&path, &e))?;
        Ok(path)
    }
}

/// Copy `[config]` values only the installed manifest has, so earlier
/// answers survive an update
fn carry_over_config(source: &Manifest, target: &Manifest) {
    for key in source.section_keys(CONFIG_SECTION) {
        if IDENTITY_KEYS.contains(&key.as_str()) || target.get(CONFIG_SECTION, &key).is_some() {
            continue;
        }
        if let Some(value) = source.get(CONFIG_SECTION, &key) {
            debug!(key = %key, "carrying over config value");
            target.set(CONFIG_SECTION, &key, value);
        }
    }
}

/// Namespace state root: `--root`, else `~/.rigger`
pub fn default_state_root() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".rigger"))
}
