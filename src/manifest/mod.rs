//! Manifest model
//!
//! A [`Manifest`] is a shared handle over parsed sections, the declared
//! inputs and any extra context the driver stamps in. Cloning the handle is
//! cheap; every clone and every [`FeatureConfig`] view observes the same
//! data, so writes through a feature config are visible to the manifest and
//! to later template substitutions.
//!
//! Loading resolves the source (URL or path), applies `extends`
//! inheritance, declares inputs, computes the dependency order and settles
//! the namespace.

pub mod config;
pub mod inputs;
pub mod parser;
pub mod source;
pub mod template;

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;
use std::rc::Rc;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, warn};

pub use config::FeatureConfig;
pub use source::Credentials;

use crate::error::{self, Result, RiggerError};
use crate::resolver;
use crate::ui::prompt::Prompter;
use inputs::Inputs;
use parser::Sections;
use template::Context;

/// Section holding manifest-wide settings
pub const CONFIG_SECTION: &str = "config";

/// Keys of `[config]` a parent manifest never passes to its children
const NON_INHERITED: &[&str] = &["namespace", "source", "extends"];

static NAMESPACE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"([a-zA-Z0-9_-]+)(\.[a-zA-Z0-9_]+)?$").ok());

/// How a manifest is loaded
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Namespace that wins over anything in the document
    pub namespace: Option<String>,
    /// Basic auth for remote sources
    pub credentials: Credentials,
    /// Reject invalid TLS certificates
    pub verify_certificate: bool,
    /// Follow `extends`
    pub do_inherit: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            namespace: None,
            credentials: Credentials::default(),
            verify_certificate: true,
            do_inherit: true,
        }
    }
}

#[derive(Debug, Default)]
struct ManifestData {
    sections: Sections,
    inputs: Inputs,
    additional_context: IndexMap<String, String>,
    namespace: Option<String>,
    order: Vec<String>,
}

/// Shared handle to a parsed manifest
#[derive(Clone)]
pub struct Manifest {
    data: Rc<RefCell<ManifestData>>,
    prompter: Rc<dyn Prompter>,
}

impl fmt::Debug for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.borrow();
        f.debug_struct("Manifest")
            .field("namespace", &data.namespace)
            .field("sections", &data.sections.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Manifest {
    /// Two manifests are equal when they hold the same section/key/value
    /// triples, checked in both directions.
    fn eq(&self, other: &Self) -> bool {
        if Rc::ptr_eq(&self.data, &other.data) {
            return true;
        }
        let ours = self.data.borrow();
        let theirs = other.data.borrow();
        contains_all(&ours.sections, &theirs.sections)
            && contains_all(&theirs.sections, &ours.sections)
    }
}

fn contains_all(left: &Sections, right: &Sections) -> bool {
    left.iter().all(|(name, entries)| {
        right.get(name).is_some_and(|other| {
            entries
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
        })
    })
}

impl Manifest {
    /// Load a manifest from a URL or local path
    ///
    /// # Errors
    ///
    /// Propagates retrieval errors (including `BadCredentials` and
    /// `CertificateInvalid`), parse errors, inheritance cycles and
    /// dependency graph errors.
    pub fn load(location: &str, options: &LoadOptions, prompter: Rc<dyn Prompter>) -> Result<Self> {
        let mut visited = HashSet::new();
        let sections = load_sections(location, options, &mut visited)?;
        Self::from_sections(sections, options.namespace.clone(), prompter)
    }

    /// Load a manifest from an already open handle
    ///
    /// Relative `extends` paths resolve against the working directory.
    ///
    /// # Errors
    ///
    /// Same as [`Manifest::load`], plus read failures on the handle.
    pub fn from_reader(
        name: &str,
        mut reader: impl Read,
        options: &LoadOptions,
        prompter: Rc<dyn Prompter>,
    ) -> Result<Self> {
        let mut body = String::new();
        reader
            .read_to_string(&mut body)
            .map_err(|e| error::manifest::read_failed(name, e.to_string()))?;
        let mut visited = HashSet::new();
        let sections = assemble(&body, name, None, None, options, &mut visited)?;
        Self::from_sections(sections, options.namespace.clone(), prompter)
    }

    /// Parse manifest text without following `extends`
    ///
    /// # Errors
    ///
    /// Parse and dependency graph errors.
    pub fn parse(text: &str, prompter: Rc<dyn Prompter>) -> Result<Self> {
        let options = LoadOptions {
            do_inherit: false,
            ..LoadOptions::default()
        };
        Self::from_reader("<text>", text.as_bytes(), &options, prompter)
    }

    fn from_sections(
        mut sections: Sections,
        namespace: Option<String>,
        prompter: Rc<dyn Prompter>,
    ) -> Result<Self> {
        sections.entry(CONFIG_SECTION.to_string()).or_default();

        let mut inputs = Inputs::new();
        for entries in sections.values() {
            if let Some(raw) = entries.get("inputs") {
                inputs.declare(raw);
            }
        }
        let names: Vec<String> = inputs.names().map(str::to_string).collect();
        if let Some(config) = sections.get(CONFIG_SECTION) {
            for name in names {
                if let Some(value) = config.get(&name) {
                    inputs.assign(&name, value.clone());
                }
            }
        }

        let order = dependency_order(&sections)?;

        let config = sections.get(CONFIG_SECTION);
        let namespace = namespace
            .or_else(|| config.and_then(|c| c.get("namespace")).cloned())
            .or_else(|| {
                config
                    .and_then(|c| c.get("source"))
                    .and_then(|s| namespace_from_source(s))
            });
        if namespace.is_none() {
            warn!("Unable to determine a namespace for this manifest");
        }

        Ok(Self {
            data: Rc::new(RefCell::new(ManifestData {
                sections,
                inputs,
                additional_context: IndexMap::new(),
                namespace,
                order,
            })),
            prompter,
        })
    }

    pub fn namespace(&self) -> Option<String> {
        self.data.borrow().namespace.clone()
    }

    pub fn set_namespace(&self, namespace: impl Into<String>) {
        self.data.borrow_mut().namespace = Some(namespace.into());
    }

    /// Where this manifest was loaded from, as recorded in `config.source`
    pub fn source(&self) -> Option<String> {
        self.get(CONFIG_SECTION, "source")
    }

    pub fn has_section(&self, section: &str) -> bool {
        self.data.borrow().sections.contains_key(section)
    }

    /// Feature sections in dependency order
    pub fn formula_sections(&self) -> Vec<String> {
        self.data.borrow().order.clone()
    }

    /// Raw (unsubstituted) value
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        self.data
            .borrow()
            .sections
            .get(section)
            .and_then(|s| s.get(key))
            .cloned()
    }

    /// Write a raw value, creating the section if needed
    ///
    /// Setting a `[config]` key that names an input also resolves the input.
    pub fn set(&self, section: &str, key: &str, value: impl Into<String>) {
        let value = value.into();
        let mut data = self.data.borrow_mut();
        if section == CONFIG_SECTION {
            data.inputs.assign(key, value.clone());
        }
        data.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    pub fn remove(&self, section: &str, key: &str) -> Option<String> {
        self.data
            .borrow_mut()
            .sections
            .get_mut(section)
            .and_then(|s| s.shift_remove(key))
    }

    pub fn section_keys(&self, section: &str) -> Vec<String> {
        self.data
            .borrow()
            .sections
            .get(section)
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn section_entries(&self, section: &str) -> IndexMap<String, String> {
        self.data
            .borrow()
            .sections
            .get(section)
            .cloned()
            .unwrap_or_default()
    }

    /// Live view over one section
    ///
    /// # Errors
    ///
    /// Returns `SectionNotFound` if the section does not exist.
    pub fn get_feature_config(&self, section: &str) -> Result<FeatureConfig> {
        if !self.has_section(section) {
            return Err(error::manifest::section_not_found(section));
        }
        Ok(FeatureConfig::new(self.clone(), section))
    }

    /// Live view over `[config]`
    pub fn config(&self) -> FeatureConfig {
        FeatureConfig::new(self.clone(), CONFIG_SECTION)
    }

    /// The global substitution context
    ///
    /// Holds every `section:key` raw value, `config:<input>` for resolved
    /// inputs, the additional context and a `<key>|escaped` shell-quoted
    /// twin of each entry.
    pub fn get_context_dict(&self) -> Context {
        let data = self.data.borrow();
        let mut context = Context::new();

        for (name, entries) in &data.sections {
            for (key, value) in entries {
                context.insert(format!("{name}:{key}"), value.clone());
            }
        }
        for (name, value) in data.inputs.values() {
            context.insert(format!("{CONFIG_SECTION}:{name}"), value.to_string());
        }
        for (key, value) in &data.additional_context {
            context.insert(key.clone(), value.clone());
        }

        let escaped: Vec<(String, String)> = context
            .iter()
            .map(|(key, value)| (format!("{key}|escaped"), template::escape(value)))
            .collect();
        context.extend(escaped);
        context
    }

    /// Context for substitutions inside `section`, which may also reference
    /// its own keys without a prefix
    pub(crate) fn context_for(&self, section: Option<&str>) -> Context {
        let mut context = self.get_context_dict();
        let Some(own) = section.map(|s| self.section_entries(s)) else {
            return context;
        };
        for (key, value) in own {
            if !context.contains_key(&key) {
                context.insert(format!("{key}|escaped"), template::escape(&value));
                context.insert(key, value);
            }
        }
        context
    }

    /// Add static entries to the substitution context
    pub fn add_additional_context<I, K, V>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut data = self.data.borrow_mut();
        for (key, value) in entries {
            data.additional_context.insert(key.into(), value.into());
        }
    }

    pub fn is_input(&self, name: &str) -> bool {
        self.data.borrow().inputs.is_input(name)
    }

    /// Value of an input, prompting if it is unset or `force` is given
    ///
    /// # Errors
    ///
    /// `UnknownInput` for undeclared names, or the prompt failure.
    pub fn resolve_input(&self, name: &str, force: bool) -> Result<String> {
        let mut data = self.data.borrow_mut();
        data.inputs.resolve(name, force, self.prompter.as_ref())
    }

    /// Prompt for every unset input, or every input when `force` is set
    ///
    /// # Errors
    ///
    /// Stops at the first failed prompt.
    pub fn resolve_unset_inputs(&self, force: bool) -> Result<()> {
        let mut data = self.data.borrow_mut();
        data.inputs.resolve_unset(force, self.prompter.as_ref())
    }

    /// # Errors
    ///
    /// `UnknownInput` for undeclared names.
    #[cfg(test)]
    pub fn set_input(&self, name: &str, value: impl Into<String>) -> Result<()> {
        self.data.borrow_mut().inputs.set(name, value)
    }

    /// Render the manifest for persistence
    ///
    /// Folds persisted state into `[config]` first, so the manifest equals
    /// what a reload of the rendered text would produce.
    pub fn render(&self) -> String {
        self.fold_into_config();
        parser::render(&self.data.borrow().sections)
    }

    /// Write non-secret input values and the namespace into `[config]` and
    /// drop secret inputs from it
    fn fold_into_config(&self) {
        let (persisted, secrets) = {
            let data = self.data.borrow();
            let persisted: Vec<(String, String)> = data
                .inputs
                .persistable_values()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect();
            let secrets: Vec<String> = data
                .inputs
                .names()
                .filter(|n| data.inputs.is_secret(n))
                .map(str::to_string)
                .collect();
            (persisted, secrets)
        };

        let config = self.config();
        for (name, value) in persisted {
            config.set(&name, value);
        }
        for name in secrets {
            config.remove(&name);
        }
        if let Some(namespace) = self.namespace() {
            config.set("namespace", namespace);
        }
    }

    /// Serialize into a sink
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the sink rejects the write.
    pub fn write(&self, sink: &mut impl Write) -> Result<()> {
        sink.write_all(self.render().as_bytes())?;
        Ok(())
    }

    /// Serialize to a file, replacing it atomically
    ///
    /// # Errors
    ///
    /// Returns `FileWriteFailed` if the file cannot be written.
    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut file = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| error::fs::write_failed(path, &e))?;
        self.write(&mut file)?;
        file.persist(path)
            .map_err(|e| error::fs::write_failed(path, &e.error))?;
        debug!(path = %path.display(), "wrote manifest");
        Ok(())
    }
}

/// Derive a namespace from the tail of a source location
///
/// `https://host/envs/dev.cfg` and `/home/me/dev.cfg` both yield `dev`.
pub fn namespace_from_source(source: &str) -> Option<String> {
    let trimmed = source.trim_end_matches(['/', '\\']);
    NAMESPACE_PATTERN
        .as_ref()?
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn dependency_order(sections: &Sections) -> Result<Vec<String>> {
    let nodes: Vec<resolver::Node> = sections
        .iter()
        .filter(|(name, _)| name.as_str() != CONFIG_SECTION)
        .map(|(name, entries)| {
            let deps = entries
                .get("depends")
                .map(|d| resolver::parse_depends(d))
                .unwrap_or_default();
            (name.clone(), deps)
        })
        .collect();
    resolver::order(&nodes)
}

fn load_sections(
    location: &str,
    options: &LoadOptions,
    visited: &mut HashSet<String>,
) -> Result<Sections> {
    let fetched = source::read_location(location, &options.credentials, options.verify_certificate)?;
    assemble(
        &fetched.body,
        location,
        Some(&fetched.provenance),
        fetched.base_dir.as_deref(),
        options,
        visited,
    )
}

fn assemble(
    body: &str,
    name: &str,
    provenance: Option<&str>,
    base_dir: Option<&Path>,
    options: &LoadOptions,
    visited: &mut HashSet<String>,
) -> Result<Sections> {
    if let Some(provenance) = provenance {
        if !visited.insert(provenance.to_string()) {
            return Err(RiggerError::InheritanceCycle {
                source_name: provenance.to_string(),
            });
        }
    }

    let mut sections = parser::parse(body, name)?;
    let config = sections.entry(CONFIG_SECTION.to_string()).or_default();
    if let Some(provenance) = provenance {
        config
            .entry("source".to_string())
            .or_insert_with(|| provenance.to_string());
    }

    if !options.do_inherit {
        return Ok(sections);
    }
    let Some(extends) = config.get("extends").cloned() else {
        return Ok(sections);
    };

    let location = source::resolve_relative(&extends, base_dir);
    debug!(parent = %location, child = %name, "inheriting manifest");
    let parent = load_sections(&location, options, visited)?;
    inherit(&mut sections, parent);
    Ok(sections)
}

/// Copy every parent key the child does not define
fn inherit(child: &mut Sections, parent: Sections) {
    for (section, entries) in parent {
        let target = child.entry(section.clone()).or_default();
        for (key, value) in entries {
            if section == CONFIG_SECTION && NON_INHERITED.contains(&key.as_str()) {
                continue;
            }
            target.entry(key).or_insert(value);
        }
    }
}
