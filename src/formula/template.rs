//! `template` formula: render a file from a local path or URL
//!
//! ```text
//! [gitconfig]
//! formula = template
//! source = templates/gitconfig
//! target = ~/.gitconfig
//! replace_templated = true
//! ```
//!
//! With `replace_templated`, `%(section:key)s` placeholders in the file are
//! substituted against the manifest. A relative `source` is read next to
//! the manifest; a relative `target` lands in the feature's install
//! directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Formula, FormulaContext, base};
use crate::error::{self, Result};
use crate::manifest::source::{self, Credentials};

#[derive(Debug, Default)]
pub struct TemplateFormula;

impl TemplateFormula {
    fn target_path(ctx: &FormulaContext<'_>) -> Result<PathBuf> {
        Ok(resolve_target(ctx, &ctx.require("target")?))
    }

    /// Directory of the manifest file the feature came from, if local
    fn manifest_dir(ctx: &FormulaContext<'_>) -> Option<PathBuf> {
        let location = ctx.config()?.manifest().source()?;
        if source::is_url(&location) {
            return None;
        }
        Path::new(&location).parent().map(Path::to_path_buf)
    }

    fn render(ctx: &FormulaContext<'_>) -> Result<()> {
        let location = ctx.require("source")?;
        let location = source::resolve_relative(&location, Self::manifest_dir(ctx).as_deref());
        let fetched = source::read_location(&location, &Credentials::default(), true)?;

        let replace = ctx
            .config()
            .is_some_and(|c| c.get_bool("replace_templated", false));
        let content = match ctx.config() {
            Some(config) if replace => config.expand(&fetched.body),
            _ => fetched.body,
        };

        let target = Self::target_path(ctx)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| error::fs::write_failed(parent, &e))?;
        }
        fs::write(&target, content).map_err(|e| error::fs::write_failed(&target, &e))?;
        debug!(feature = %ctx.name, target = %target.display(), "rendered template");
        Ok(())
    }
}

impl Formula for TemplateFormula {
    fn kind(&self) -> &'static str {
        "template"
    }

    fn required_options(&self) -> &'static [&'static str] {
        &["source", "target"]
    }

    fn valid_options(&self) -> &'static [&'static str] {
        &["replace_templated", "on_update"]
    }

    fn install(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        Self::render(ctx)?;
        base::install(ctx)
    }

    fn update(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        let on_update = ctx.config().is_some_and(|c| c.get_bool("on_update", false));
        if on_update || ctx.config_changed() {
            if ctx.option_changed("target") {
                if let Some(previous) = ctx.source.and_then(|c| c.get("target").ok()) {
                    let previous = resolve_target(ctx, &previous);
                    if previous.is_file() {
                        fs::remove_file(&previous)
                            .map_err(|e| error::fs::write_failed(&previous, &e))?;
                    }
                }
            }
            Self::render(ctx)?;
        }
        base::update(ctx)
    }

    fn remove(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        let target = Self::target_path(ctx)?;
        if target.exists() {
            fs::remove_file(&target).map_err(|e| error::fs::write_failed(&target, &e))?;
        }
        base::remove(ctx)
    }
}

/// Expand `~/` and anchor relative paths in the install directory
fn resolve_target(ctx: &FormulaContext<'_>, target: &str) -> PathBuf {
    let path = match (target.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(target),
    };
    if path.is_relative() {
        ctx.install_directory().join(path)
    } else {
        path
    }
}
