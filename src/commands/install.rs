//! Install command implementation
//!
//! 1. Load the manifest (retrying once with prompted credentials when a
//!    protected URL rejects the request)
//! 2. Open the environment for the manifest's namespace
//! 3. Install, or update when the namespace already exists

use tracing::info;

use super::CommandContext;
use crate::cli::InstallArgs;
use crate::error::{Result, RiggerError};
use crate::manifest::{Credentials, LoadOptions, Manifest};
use crate::ui;

/// # Errors
///
/// Manifest retrieval and parse errors, `NamespaceUnresolved`, or any
/// failure of the install itself.
pub fn run(ctx: &CommandContext, args: InstallArgs) -> Result<()> {
    let mut options = LoadOptions {
        namespace: args.namespace.clone(),
        credentials: Credentials::new(args.username, args.password),
        verify_certificate: !args.allow_bad_certificate,
        do_inherit: !args.no_inherit,
    };

    let manifest = match Manifest::load(&args.source, &options, ctx.prompter()) {
        Err(RiggerError::BadCredentials { url }) => {
            info!(url = %url, "credentials rejected, asking for new ones");
            options.credentials = ask_credentials(ctx, &url)?;
            Manifest::load(&args.source, &options, ctx.prompter())?
        }
        other => other?,
    };

    let mut environment = ctx
        .environment(args.namespace)
        .target(manifest)
        .warmup()?;
    let updating = environment.is_installed();
    environment.install()?;

    let verb = if updating { "Updated" } else { "Installed" };
    ui::status(verb, environment.namespace());
    Ok(())
}

fn ask_credentials(ctx: &CommandContext, url: &str) -> Result<Credentials> {
    let username = ctx
        .prompter
        .text("username", &format!("Username for {url}"), None)?;
    let password = ctx
        .prompter
        .secret("password", &format!("Password for {url}"), None)?;
    Ok(Credentials::new(Some(username), Some(password)))
}
