//! Validate command implementation

use super::CommandContext;
use crate::cli::ValidateArgs;
use crate::error::Result;
use crate::manifest::{self, LoadOptions, Manifest};
use crate::ui;

/// Load a manifest and report configuration errors without installing
///
/// # Errors
///
/// Load and parse errors, or `FeatureErrors` listing the invalid features.
pub fn run(ctx: &CommandContext, args: ValidateArgs) -> Result<()> {
    let options = LoadOptions {
        do_inherit: !args.no_inherit,
        ..LoadOptions::default()
    };
    let target = Manifest::load(&args.source, &options, ctx.prompter())?;
    let namespace = target
        .namespace()
        .or_else(|| manifest::namespace_from_source(&args.source));

    let mut environment = ctx.environment(namespace).target(target).warmup()?;
    environment.validate()?;
    ui::status("Valid", &args.source);
    Ok(())
}
