//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - install: Install command arguments
//! - update: Update command arguments
//! - namespace: Arguments shared by remove, activate and deactivate
//! - validate: Validate command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod completions;
pub mod install;
pub mod namespace;
pub mod update;
pub mod validate;

pub use completions::CompletionsArgs;
pub use install::InstallArgs;
pub use namespace::NamespaceArgs;
pub use update::UpdateArgs;
pub use validate::ValidateArgs;

/// Rigger - declarative environment bootstrapping
///
/// Install, update and remove environments described by layered manifests.
#[derive(Parser, Debug)]
#[command(
    name = "rigger",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Declarative environment bootstrapping from layered manifests",
    long_about = "Rigger installs an environment described by an INI-style manifest into a \
                  namespace directory, hooks it into your shell and keeps it in sync as the \
                  manifest changes.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  rigger install ./dev.cfg                 \x1b[90m# Install the dev namespace\x1b[0m\n   \
                  rigger install https://host/dev.cfg      \x1b[90m# Install from a URL\x1b[0m\n   \
                  rigger update dev                        \x1b[90m# Reconcile with the manifest source\x1b[0m\n   \
                  rigger deactivate dev                    \x1b[90m# Unhook from the shell\x1b[0m\n   \
                  rigger remove dev                        \x1b[90m# Remove everything\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Directory holding installed namespaces (defaults to ~/.rigger)
    #[arg(long, short = 'r', global = true, env = "RIGGER_ROOT")]
    pub root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install an environment from a manifest
    Install(InstallArgs),

    /// Reconcile an installed environment with its manifest
    Update(UpdateArgs),

    /// Remove an installed environment
    Remove(NamespaceArgs),

    /// Hook an installed environment into the shell
    Activate(NamespaceArgs),

    /// Unhook an installed environment from the shell
    Deactivate(NamespaceArgs),

    /// Check a manifest for configuration errors
    Validate(ValidateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
