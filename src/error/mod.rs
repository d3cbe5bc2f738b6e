//! Error types and handling for Rigger
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`manifest`]: Manifest parsing, inheritance and retrieval errors
//! - [`deps`]: Dependency ordering errors
//! - [`input`]: Input registry errors
//! - [`feature`]: Per-feature executor errors
//! - [`environment`]: Namespace and driver precondition errors
//! - [`git`]: Git operation errors
//! - [`fs`]: File system errors

pub mod deps;
pub mod environment;
pub mod feature;
pub mod fs;
pub mod git;
pub mod input;
pub mod manifest;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for Rigger operations
#[derive(Error, Diagnostic, Debug)]
pub enum RiggerError {
    // Manifest errors
    #[error("Failed to parse manifest {source_name} at line {line}: {message}")]
    #[diagnostic(
        code(rigger::manifest::parse_failed),
        help("Manifests use [section] headers followed by `key = value` lines")
    )]
    ManifestParse {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("Failed to read manifest {source_name}: {reason}")]
    #[diagnostic(code(rigger::manifest::read_failed))]
    ManifestRead { source_name: String, reason: String },

    #[error("Failed to fetch manifest {url}: {reason}")]
    #[diagnostic(
        code(rigger::manifest::fetch_failed),
        help("Check that the URL is reachable from this machine")
    )]
    ManifestFetch { url: String, reason: String },

    #[error("Bad credentials for {url}")]
    #[diagnostic(
        code(rigger::manifest::bad_credentials),
        help("Pass --username and --password, or answer the credential prompt")
    )]
    BadCredentials { url: String },

    #[error("Certificate for {url} could not be verified")]
    #[diagnostic(
        code(rigger::manifest::certificate_invalid),
        help("Pass --allow-bad-certificate to skip verification")
    )]
    CertificateInvalid { url: String },

    #[error("Manifest inheritance cycle through {source_name}")]
    #[diagnostic(code(rigger::manifest::inheritance_cycle))]
    InheritanceCycle { source_name: String },

    #[error("Parameter '{key}' not found in section [{section}]")]
    #[diagnostic(code(rigger::manifest::param_not_found))]
    ParamNotFound { section: String, key: String },

    #[error("Section [{section}] not found")]
    #[diagnostic(code(rigger::manifest::section_not_found))]
    SectionNotFound { section: String },

    // Dependency errors
    #[error("Feature '{name}' is declared more than once")]
    #[diagnostic(code(rigger::deps::duplicate_node))]
    DuplicateNode { name: String },

    #[error("Circular dependency: '{node}' waits on '{dependency}'")]
    #[diagnostic(
        code(rigger::deps::circular),
        help("Remove one of the `depends` entries forming the cycle")
    )]
    CircularDependency { node: String, dependency: String },

    #[error("Feature '{node}' depends on '{dependency}', which is not declared")]
    #[diagnostic(code(rigger::deps::missing))]
    MissingDependency { node: String, dependency: String },

    // Input errors
    #[error("'{name}' is not a declared input")]
    #[diagnostic(
        code(rigger::input::unknown),
        help("Declare it under `inputs` in the [config] section")
    )]
    UnknownInput { name: String },

    #[error("Input '{name}' has no value and no default")]
    #[diagnostic(
        code(rigger::input::required),
        help("Run from an interactive terminal to be prompted for it")
    )]
    InputRequired { name: String },

    #[error("Prompt for '{name}' failed: {reason}")]
    #[diagnostic(code(rigger::input::prompt_failed))]
    PromptFailed { name: String, reason: String },

    // Feature errors
    #[error("Unknown formula '{kind}'")]
    #[diagnostic(
        code(rigger::feature::unknown_formula),
        help("Built-in formulas are: command, env, git, link, template")
    )]
    UnknownFormula { kind: String },

    #[error("Feature '{feature}' failed: {message}")]
    #[diagnostic(code(rigger::feature::failed))]
    FormulaFailed { feature: String, message: String },

    #[error("Command `{command}` exited with {status}")]
    #[diagnostic(code(rigger::feature::command_failed))]
    CommandFailed { command: String, status: String },

    #[error("{count} feature(s) failed: {features}")]
    #[diagnostic(
        code(rigger::feature::errors),
        help("The full error listing was written to the debug log")
    )]
    FeatureErrors { count: usize, features: String },

    #[error("Interrupted")]
    #[diagnostic(code(rigger::interrupted))]
    Interrupted,

    // Environment errors
    #[error("Unable to determine a namespace")]
    #[diagnostic(
        code(rigger::environment::namespace_unresolved),
        help("Set `namespace` in the [config] section or pass --namespace")
    )]
    NamespaceUnresolved,

    #[error("Namespace '{namespace}' is not installed")]
    #[diagnostic(
        code(rigger::environment::not_installed),
        help("Run 'rigger install <manifest>' first")
    )]
    NotInstalled { namespace: String },

    #[error("No manifest to install for namespace '{namespace}'")]
    #[diagnostic(code(rigger::environment::manifest_required))]
    ManifestRequired { namespace: String },

    #[error("Unknown shell: {shell}")]
    #[diagnostic(
        code(rigger::cli::unknown_shell),
        help("Supported shells: bash, elvish, fish, powershell, zsh")
    )]
    UnknownShell { shell: String },

    // Git errors
    #[error("Git operation failed: {message}")]
    #[diagnostic(code(rigger::git::operation_failed))]
    GitOperationFailed { message: String },

    #[error("Failed to clone repository: {url}: {reason}")]
    #[diagnostic(
        code(rigger::git::clone_failed),
        help("Check that URL is correct and you have access to repository")
    )]
    GitCloneFailed { url: String, reason: String },

    // File system errors
    #[error("Failed to read file: {path}")]
    #[diagnostic(code(rigger::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}")]
    #[diagnostic(code(rigger::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(rigger::io::error))]
    IoError { message: String },
}

/// Result type alias using miette for rich error reporting
pub type Result<T> = miette::Result<T, RiggerError>;

impl From<std::io::Error> for RiggerError {
    fn from(err: std::io::Error) -> Self {
        RiggerError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<git2::Error> for RiggerError {
    fn from(err: git2::Error) -> Self {
        RiggerError::GitOperationFailed {
            message: err.message().to_string(),
        }
    }
}

impl From<inquire::InquireError> for RiggerError {
    fn from(err: inquire::InquireError) -> Self {
        match err {
            inquire::InquireError::OperationInterrupted
            | inquire::InquireError::OperationCanceled => RiggerError::Interrupted,
            other => RiggerError::PromptFailed {
                name: String::new(),
                reason: other.to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for RiggerError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(ToString::to_string).unwrap_or_default();
        RiggerError::ManifestFetch {
            url,
            reason: err.to_string(),
        }
    }
}
