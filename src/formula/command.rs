//! `command` formula: run shell commands at each lifecycle step
//!
//! ```text
//! [pyenv]
//! formula = command
//! install = git clone https://github.com/pyenv/pyenv.git .
//! update = git pull
//! remove = echo bye
//! ```
//!
//! Commands run in the feature's install directory. On update, a changed
//! configuration reruns `install`; otherwise only `update` runs.

use tracing::warn;

use super::{Formula, FormulaContext, base};
use crate::error::Result;

#[derive(Debug, Default)]
pub struct CommandFormula;

impl CommandFormula {
    fn run(ctx: &mut FormulaContext<'_>, option: &str) -> Result<()> {
        let Some(command) = ctx.option(option) else {
            return Ok(());
        };
        let dir = ctx.install_directory();
        std::fs::create_dir_all(&dir)
            .map_err(|e| crate::error::fs::write_failed(&dir, &e))?;

        match base::run_shell(&command, &dir) {
            Ok(()) => Ok(()),
            Err(e) if !ctx.config().is_some_and(|c| c.get_bool("fail_on_error", true)) => {
                warn!(feature = %ctx.name, error = %e, "Ignoring failed command");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl Formula for CommandFormula {
    fn kind(&self) -> &'static str {
        "command"
    }

    fn valid_options(&self) -> &'static [&'static str] {
        &[
            "install",
            "update",
            "remove",
            "activate",
            "deactivate",
            "fail_on_error",
        ]
    }

    fn install(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        Self::run(ctx, "install")?;
        base::install(ctx)
    }

    fn update(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        if ctx.config_changed() {
            Self::run(ctx, "install")?;
        } else {
            Self::run(ctx, "update")?;
        }
        base::update(ctx)
    }

    fn remove(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        Self::run(ctx, "remove")?;
        ctx.directory.remove_feature(ctx.name)?;
        base::remove(ctx)
    }

    fn activate(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        Self::run(ctx, "activate")?;
        base::activate(ctx)
    }

    fn deactivate(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        Self::run(ctx, "deactivate")?;
        base::deactivate(ctx)
    }
}
