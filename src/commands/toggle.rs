//! Activate and deactivate commands

use super::CommandContext;
use crate::cli::NamespaceArgs;
use crate::error::Result;
use crate::ui;

/// Hook the namespace back into the shell startup files
///
/// # Errors
///
/// `NotInstalled`, `FeatureErrors`, or the first fatal error.
pub fn activate(ctx: &CommandContext, args: NamespaceArgs) -> Result<()> {
    let mut environment = ctx.environment(Some(args.namespace)).warmup()?;
    environment.activate()?;
    ui::status("Activated", environment.namespace());
    Ok(())
}

/// # Errors
///
/// `NotInstalled`, `FeatureErrors`, or the first fatal error.
pub fn deactivate(ctx: &CommandContext, args: NamespaceArgs) -> Result<()> {
    let mut environment = ctx.environment(Some(args.namespace)).warmup()?;
    environment.deactivate()?;
    ui::status("Deactivated", environment.namespace());
    ui::warning("open a new shell for the change to take effect");
    Ok(())
}
