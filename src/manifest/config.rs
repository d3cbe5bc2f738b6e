//! Per-section configuration view
//!
//! A [`FeatureConfig`] reads and writes one section of its [`Manifest`]
//! directly, so values set here are what the manifest persists. Reads go
//! through template substitution against the manifest-wide context.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use tracing::warn;

use super::template::{self, FormatError};
use super::{CONFIG_SECTION, Manifest};
use crate::error::{self, Result};

/// Upper bound on substitution passes for one value
pub const MAX_SUBSTITUTIONS: usize = 5;

/// Live view over one manifest section
#[derive(Clone)]
pub struct FeatureConfig {
    manifest: Manifest,
    section: String,
}

impl fmt::Debug for FeatureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureConfig")
            .field("section", &self.section)
            .field("raw", &self.manifest.section_entries(&self.section))
            .finish()
    }
}

impl FeatureConfig {
    pub(crate) fn new(manifest: Manifest, section: impl Into<String>) -> Self {
        Self {
            manifest,
            section: section.into(),
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Fully substituted value of `key`
    ///
    /// # Errors
    ///
    /// Returns `ParamNotFound` if the key is absent.
    pub fn get(&self, key: &str) -> Result<String> {
        let raw = self
            .raw(key)
            .ok_or_else(|| error::manifest::param_not_found(&self.section, key))?;
        Ok(self.substitute(key, raw))
    }

    /// Substituted value of `key`, or `default` when absent
    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|_| default.to_string())
    }

    /// Boolean flag; accepts `true/yes/on/1` and `false/no/off/0`
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Ok(value) => match value.trim().to_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => true,
                "false" | "no" | "off" | "0" => false,
                _ => default,
            },
            Err(_) => default,
        }
    }

    /// Unsubstituted value of `key`
    pub fn raw(&self, key: &str) -> Option<String> {
        self.manifest.get(&self.section, key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.raw(key).is_some()
    }

    /// Write through to the owning manifest
    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.manifest.set(&self.section, key, value);
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.manifest.remove(&self.section, key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.manifest.section_keys(&self.section)
    }

    /// Every key with its substituted value
    pub fn to_dict(&self) -> IndexMap<String, String> {
        self.manifest
            .section_entries(&self.section)
            .into_iter()
            .map(|(key, raw)| {
                let value = self.substitute(&key, raw);
                (key, value)
            })
            .collect()
    }

    /// Substitute placeholders in arbitrary text (file contents) against
    /// this section's context
    pub fn expand(&self, text: &str) -> String {
        self.substitute("<text>", text.to_string())
    }

    /// Apply placeholder substitution until the value settles
    ///
    /// Unknown placeholders stop substitution with a warning and keep the
    /// last good value. A `config:<input>` placeholder for an unresolved
    /// input prompts for it and retries. Malformed values (a stray `%`)
    /// are returned unchanged.
    fn substitute(&self, key: &str, raw: String) -> String {
        if !template::has_placeholders(&raw) {
            return raw;
        }

        let mut context = self.manifest.context_for(Some(&self.section));
        let mut prompted = HashSet::new();
        let mut value = raw;
        let mut passes = 0;

        while passes < MAX_SUBSTITUTIONS {
            match template::format(&value, &context) {
                Ok(next) => {
                    passes += 1;
                    if next == value {
                        break;
                    }
                    value = next;
                }
                Err(FormatError::Malformed) => break,
                Err(FormatError::MissingKey(missing)) => {
                    let Some(input) = input_name(&missing)
                        .filter(|name| self.manifest.is_input(name))
                        .filter(|name| prompted.insert(name.to_string()))
                    else {
                        warn!(
                            section = %self.section,
                            key = %key,
                            placeholder = %missing,
                            "Unable to substitute placeholder"
                        );
                        break;
                    };

                    match self.manifest.resolve_input(input, false) {
                        Ok(resolved) => {
                            context.insert(
                                format!("{CONFIG_SECTION}:{input}|escaped"),
                                template::escape(&resolved),
                            );
                            context.insert(format!("{CONFIG_SECTION}:{input}"), resolved);
                        }
                        Err(e) => {
                            warn!(input = %input, error = %e, "Unable to resolve input");
                            break;
                        }
                    }
                }
            }
        }

        value
    }
}

/// Input name referenced by a `config:<name>` or `config:<name>|escaped` key
fn input_name(key: &str) -> Option<&str> {
    let rest = key.strip_prefix(CONFIG_SECTION)?.strip_prefix(':')?;
    Some(rest.strip_suffix("|escaped").unwrap_or(rest))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::error::RiggerError;
    use crate::test_fixtures::ScriptedPrompter;

    fn manifest(text: &str, answers: &[(&str, &str)]) -> (Manifest, Rc<ScriptedPrompter>) {
        let prompter = Rc::new(ScriptedPrompter::new(answers));
        let manifest = Manifest::parse(text, prompter.clone()).unwrap();
        (manifest, prompter)
    }

    #[test]
    fn test_plain_value_returned_as_is() {
        let (m, _) = manifest("[a]\nvalue = plain text\n", &[]);
        let config = m.get_feature_config("a").unwrap();
        assert_eq!(config.get("value").unwrap(), "plain text");
    }

    #[test]
    fn test_missing_key_is_param_not_found() {
        let (m, _) = manifest("[a]\n", &[]);
        let config = m.get_feature_config("a").unwrap();
        assert!(matches!(
            config.get("nope"),
            Err(RiggerError::ParamNotFound { .. })
        ));
        assert_eq!(config.get_or("nope", "fallback"), "fallback");
    }

    #[test]
    fn test_input_placeholder_resolves() {
        let (m, _) = manifest("[config]\ninputs = name\n[a]\ngreeting = %(config:name)s\n", &[]);
        m.set_input("name", "world").unwrap();
        let config = m.get_feature_config("a").unwrap();
        assert_eq!(config.get("greeting").unwrap(), "world");
    }

    #[test]
    fn test_unresolved_input_prompted_once() {
        let (m, prompter) = manifest(
            "[config]\ninputs = name\n[a]\ngreeting = hello %(config:name)s\nshout = %(config:name|escaped)s!\n",
            &[("name", "big world")],
        );
        let config = m.get_feature_config("a").unwrap();
        assert_eq!(config.get("greeting").unwrap(), "hello big world");
        assert_eq!(
            config.get("shout").unwrap(),
            format!("{}!", template::escape("big world"))
        );
        assert_eq!(prompter.asked(), vec!["name"]);
    }

    #[test]
    fn test_nested_references_resolve() {
        let (m, _) = manifest(
            "[config]\nroot = /opt\n[a]\ndir = %(config:root)s/a\nbin = %(a:dir)s/bin\nlink = %(bin)s/tool\n",
            &[],
        );
        let config = m.get_feature_config("a").unwrap();
        assert_eq!(config.get("link").unwrap(), "/opt/a/bin/tool");
    }

    #[test]
    fn test_unknown_placeholder_returns_partial() {
        let (m, _) = manifest("[config]\nx = 1\n[a]\nv = %(config:x)s-%(ghost:key)s\n", &[]);
        let config = m.get_feature_config("a").unwrap();
        assert_eq!(config.get("v").unwrap(), "%(config:x)s-%(ghost:key)s");
    }

    #[test]
    fn test_malformed_value_returned_unchanged() {
        let (m, _) = manifest("[config]\ninputs = password\n[a]\nv = %(config:password)s\n", &[]);
        m.set_input("password", "p%ss").unwrap();
        let config = m.get_feature_config("a").unwrap();
        assert_eq!(config.get("v").unwrap(), "p%ss");

        let (m, _) = manifest("[a]\nv = 100% sure\n", &[]);
        assert_eq!(m.get_feature_config("a").unwrap().get("v").unwrap(), "100% sure");
    }

    #[test]
    fn test_substitution_is_bounded() {
        let (m, _) = manifest("[a]\nv = %(a:w)s\nw = %(a:v)s\n", &[]);
        let config = m.get_feature_config("a").unwrap();
        let value = config.get("v").unwrap();
        assert!(value == "%(a:v)s" || value == "%(a:w)s");
    }

    fn chain(depth: usize) -> String {
        let mut text = String::from("[a]\n");
        for i in 0..depth {
            text.push_str(&format!("k{i} = %(a:k{})s\n", i + 1));
        }
        text.push_str(&format!("k{depth} = end\n"));
        text
    }

    #[test]
    fn test_chain_within_pass_limit_resolves() {
        let (m, _) = manifest(&chain(MAX_SUBSTITUTIONS), &[]);
        let config = m.get_feature_config("a").unwrap();
        assert_eq!(config.get("k0").unwrap(), "end");
    }

    #[test]
    fn test_chain_past_pass_limit_stops_partway() {
        let depth = MAX_SUBSTITUTIONS + 1;
        let (m, _) = manifest(&chain(depth), &[]);
        let config = m.get_feature_config("a").unwrap();
        assert_eq!(config.get("k0").unwrap(), format!("%(a:k{depth})s"));
    }

    #[test]
    fn test_set_writes_through() {
        let (m, _) = manifest("[a]\nx = 1\n", &[]);
        let config = m.get_feature_config("a").unwrap();
        config.set("y", "2");
        assert_eq!(m.get("a", "y").as_deref(), Some("2"));
        assert_eq!(config.remove("x").as_deref(), Some("1"));
        assert!(!config.has("x"));
        assert_eq!(config.keys(), vec!["y"]);
    }

    #[test]
    fn test_to_dict_resolves_every_key() {
        let (m, _) = manifest("[config]\nroot = /r\n[a]\ndir = %(config:root)s/a\nname = a\n", &[]);
        let dict = m.get_feature_config("a").unwrap().to_dict();
        assert_eq!(dict["dir"], "/r/a");
        assert_eq!(dict["name"], "a");
    }

    #[test]
    fn test_get_bool() {
        let (m, _) = manifest("[a]\nyes = Yes\noff = off\njunk = maybe\n", &[]);
        let config = m.get_feature_config("a").unwrap();
        assert!(config.get_bool("yes", false));
        assert!(!config.get_bool("off", true));
        assert!(config.get_bool("junk", true));
        assert!(!config.get_bool("missing", false));
    }

    #[test]
    fn test_input_name() {
        assert_eq!(input_name("config:user"), Some("user"));
        assert_eq!(input_name("config:user|escaped"), Some("user"));
        assert_eq!(input_name("git:url"), None);
        assert_eq!(input_name("configx:user"), None);
    }
}
