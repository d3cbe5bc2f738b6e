//! Rigger - declarative environment bootstrapping
//!
//! Installs environments described by layered INI-style manifests into
//! per-namespace directories, hooks them into the user's shell and keeps
//! them reconciled as the manifests change.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod engine;
mod environment;
mod error;
mod formula;
mod git;
mod manifest;
mod resolver;
mod transaction;
mod ui;

#[cfg(test)]
mod test_fixtures;

use cli::{Cli, Commands};
use commands::CommandContext;
use engine::CancellationToken;
use error::Result;

/// `RUST_LOG` wins; otherwise `--verbose` turns on debug output
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "rigger=debug" } else { "warn" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Ctrl-C only raises the flag; the engine stops at the next feature
fn install_interrupt_handler(cancel: &CancellationToken) {
    let flag = Arc::clone(cancel);
    if let Err(e) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Unable to install interrupt handler");
    }
}

fn run(cli: Cli, cancel: CancellationToken) -> Result<()> {
    let context = || CommandContext::new(cli.root.clone(), Arc::clone(&cancel));
    match cli.command {
        Commands::Install(args) => commands::install::run(&context()?, args),
        Commands::Update(args) => commands::update::run(&context()?, args),
        Commands::Remove(args) => commands::remove::run(&context()?, args),
        Commands::Activate(args) => commands::toggle::activate(&context()?, args),
        Commands::Deactivate(args) => commands::toggle::deactivate(&context()?, args),
        Commands::Validate(args) => commands::validate::run(&context()?, args),
        Commands::Completions(args) => commands::completions::run(args),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cancel: CancellationToken = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(&cancel);

    if let Err(e) = run(cli, cancel) {
        eprintln!("{:?}", miette::Report::new(e));
        std::process::exit(1);
    }
}
