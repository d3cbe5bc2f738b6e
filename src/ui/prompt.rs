//! Interactive prompting
//!
//! All user interaction goes through the [`Prompter`] trait so the manifest
//! layer can ask for input values without knowing whether a terminal is
//! attached. [`TerminalPrompter`] uses inquire when stdin and stdout are
//! terminals and falls back to defaults otherwise.

use std::fmt;
use std::io::IsTerminal;

use inquire::{Password, PasswordDisplayMode, Text};

use crate::error::{self, Result};

/// Source of answers for interactive questions
pub trait Prompter: fmt::Debug {
    /// Ask for a plain value, offering `default` when present
    fn text(&self, name: &str, message: &str, default: Option<&str>) -> Result<String>;

    /// Ask for a value without echoing it; an empty answer selects `default`
    fn secret(&self, name: &str, message: &str, default: Option<&str>) -> Result<String>;
}

/// Prompter backed by the controlling terminal
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn interactive() -> bool {
        std::io::stdin().is_terminal() && console::user_attended()
    }
}

impl Prompter for TerminalPrompter {
    fn text(&self, name: &str, message: &str, default: Option<&str>) -> Result<String> {
        if !Self::interactive() {
            return default
                .map(str::to_string)
                .ok_or_else(|| error::input::required(name));
        }

        let mut prompt = Text::new(message);
        if let Some(default) = default {
            prompt = prompt.with_default(default);
        }
        prompt
            .prompt()
            .map_err(|e| error::input::prompt_failed(name, e))
    }

    fn secret(&self, name: &str, message: &str, default: Option<&str>) -> Result<String> {
        if !Self::interactive() {
            return default
                .map(str::to_string)
                .ok_or_else(|| error::input::required(name));
        }

        let answer = Password::new(message)
            .with_display_mode(PasswordDisplayMode::Masked)
            .without_confirmation()
            .prompt()
            .map_err(|e| error::input::prompt_failed(name, e))?;

        match default {
            Some(default) if answer.is_empty() => Ok(default.to_string()),
            _ => Ok(answer),
        }
    }
}
