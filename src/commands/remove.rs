//! Remove command implementation

use super::CommandContext;
use crate::cli::NamespaceArgs;
use crate::error::Result;
use crate::ui;

/// # Errors
///
/// `NotInstalled`, `FeatureErrors`, or the first fatal error.
pub fn run(ctx: &CommandContext, args: NamespaceArgs) -> Result<()> {
    let mut environment = ctx.environment(Some(args.namespace)).warmup()?;
    environment.remove()?;
    ui::status("Removed", environment.namespace());
    Ok(())
}
