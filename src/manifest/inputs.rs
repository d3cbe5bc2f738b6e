//! User-supplied manifest inputs
//!
//! Inputs are declared one per line under an `inputs` key:
//!
//! ```text
//! inputs = username
//!     password?
//!     shell==zsh
//!     token?==none
//! ```
//!
//! A trailing `?` marks a secret (never written back to disk) and `==`
//! introduces a default. Names are lower-cased like manifest keys. Values
//! are resolved lazily through a [`Prompter`].

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{self, Result};
use crate::ui::prompt::Prompter;

/// One declared input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub name: String,
    pub secret: bool,
    pub default: Option<String>,
    value: Option<String>,
}

impl Input {
    /// Parse a single declaration line
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (head, default) = match line.split_once("==") {
            Some((head, default)) => (head.trim(), Some(default.trim().to_string())),
            None => (line, None),
        };
        let (name, secret) = match head.strip_suffix('?') {
            Some(name) => (name.trim(), true),
            None => (head, false),
        };
        if name.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_lowercase(),
            secret,
            default,
            value: None,
        })
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    fn prompt_message(&self) -> String {
        format!("Please enter {}", self.name.replace('_', " "))
    }
}

/// Registry of declared inputs and their resolved values
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    entries: IndexMap<String, Input>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every declaration in a raw `inputs` value
    ///
    /// Re-declaring a name updates its secret flag and default but keeps any
    /// value already resolved.
    pub fn declare(&mut self, raw: &str) {
        for input in raw.lines().filter_map(Input::parse) {
            match self.entries.get_mut(&input.name) {
                Some(existing) => {
                    existing.secret = input.secret;
                    existing.default = input.default;
                }
                None => {
                    self.entries.insert(input.name.clone(), input);
                }
            }
        }
    }

    pub fn is_input(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_secret(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(|i| i.secret)
    }

    /// # Errors
    ///
    /// Returns `UnknownInput` for undeclared names.
    #[cfg(test)]
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        self.entry_mut(name)?.value = Some(value.into());
        Ok(())
    }

    /// Resolve `name` if it is declared; returns whether it was
    pub fn assign(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.entries.get_mut(name) {
            Some(input) => {
                input.value = Some(value.into());
                true
            }
            None => false,
        }
    }

    /// Resolve one input, prompting when unset or when `force` is given
    ///
    /// A forced prompt offers the current value as the default.
    ///
    /// # Errors
    ///
    /// Returns `UnknownInput` for undeclared names and propagates prompt
    /// failures.
    pub fn resolve(&mut self, name: &str, force: bool, prompter: &dyn Prompter) -> Result<String> {
        let input = self.entry_mut(name)?;
        if let (Some(value), false) = (&input.value, force) {
            return Ok(value.clone());
        }

        let default = input.value.clone().or_else(|| input.default.clone());
        let message = input.prompt_message();
        debug!(input = %name, secret = input.secret, "prompting for input");
        let answer = if input.secret {
            prompter.secret(name, &message, default.as_deref())?
        } else {
            prompter.text(name, &message, default.as_deref())?
        };

        input.value = Some(answer.clone());
        Ok(answer)
    }

    /// Prompt for every unset input, or for all inputs when `force` is set
    ///
    /// # Errors
    ///
    /// Stops at the first failed prompt.
    pub fn resolve_unset(&mut self, force: bool, prompter: &dyn Prompter) -> Result<()> {
        let names: Vec<String> = self.entries.keys().cloned().collect();
        for name in names {
            self.resolve(&name, force, prompter)?;
        }
        Ok(())
    }

    /// Resolved values, secrets included
    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .filter_map(|i| i.value().map(|v| (i.name.as_str(), v)))
    }

    /// Resolved values that may be written to disk
    pub fn persistable_values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .filter(|i| !i.secret)
            .filter_map(|i| i.value().map(|v| (i.name.as_str(), v)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut Input> {
        self.entries
            .get_mut(name)
            .ok_or_else(|| error::input::unknown(name))
    }
}
