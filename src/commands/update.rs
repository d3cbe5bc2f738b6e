//! Update command implementation

use super::CommandContext;
use crate::cli::UpdateArgs;
use crate::error::Result;
use crate::ui;

/// Reconcile an installed namespace with its manifest source
///
/// # Errors
///
/// `NotInstalled`, `FeatureErrors`, or the first fatal error.
pub fn run(ctx: &CommandContext, args: UpdateArgs) -> Result<()> {
    let mut environment = ctx.environment(Some(args.namespace)).warmup()?;
    environment.update(args.reconfigure)?;
    ui::status("Updated", environment.namespace());
    Ok(())
}
