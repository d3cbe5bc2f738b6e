//! `link` formula: expose a file through the namespace `bin/` or `lib/`
//!
//! ```text
//! [tool]
//! formula = link
//! path = %(repo:root_dir)s/bin/tool.sh
//! name = tool
//! dest = bin
//! ```

use std::path::{Path, PathBuf};

use super::{Formula, FormulaContext, base};
use crate::environment::LinkDest;
use crate::error::{self, Result};
use crate::manifest::FeatureConfig;

#[derive(Debug, Default)]
pub struct LinkFormula;

/// Where the link goes and what it is called
struct LinkSpec {
    path: PathBuf,
    name: String,
    dest: LinkDest,
}

impl LinkFormula {
    fn spec(ctx: &FormulaContext<'_>, config: Option<&FeatureConfig>) -> Result<LinkSpec> {
        let config = config.ok_or_else(|| error::feature::failed(ctx.name, "no configuration"))?;
        let path = PathBuf::from(config.get("path")?);
        let name = match config.get("name") {
            Ok(name) => name,
            Err(_) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| error::feature::failed(ctx.name, "cannot derive a link name from path"))?,
        };
        let dest_raw = config.get_or("dest", "bin");
        let dest = LinkDest::parse(&dest_raw).ok_or_else(|| {
            error::feature::failed(ctx.name, format!("dest must be 'bin' or 'lib', got '{dest_raw}'"))
        })?;
        Ok(LinkSpec { path, name, dest })
    }

    fn link(ctx: &FormulaContext<'_>) -> Result<()> {
        let spec = Self::spec(ctx, ctx.config())?;
        let path = anchor(ctx, &spec.path);
        if !path.exists() {
            return Err(error::feature::failed(
                ctx.name,
                format!("link target {} does not exist", path.display()),
            ));
        }
        ctx.directory.symlink(spec.dest, &spec.name, &path)?;
        Ok(())
    }
}

impl Formula for LinkFormula {
    fn kind(&self) -> &'static str {
        "link"
    }

    fn required_options(&self) -> &'static [&'static str] {
        &["path"]
    }

    fn valid_options(&self) -> &'static [&'static str] {
        &["name", "dest"]
    }

    fn validate(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        base::validate(ctx, self.required_options(), self.valid_options(), &[]);
        let dest = ctx.target.and_then(|c| c.get("dest").ok());
        if let Some(dest) = dest {
            if LinkDest::parse(&dest).is_none() {
                ctx.log_error(format!("dest must be 'bin' or 'lib', got '{dest}'"));
            }
        }
        Ok(())
    }

    fn install(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        Self::link(ctx)?;
        base::install(ctx)
    }

    fn update(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        if ctx.config_changed() {
            if let Ok(previous) = Self::spec(ctx, ctx.source) {
                ctx.directory.unlink(previous.dest, &previous.name)?;
            }
        }
        Self::link(ctx)?;
        base::update(ctx)
    }

    fn remove(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        let spec = Self::spec(ctx, ctx.config())?;
        ctx.directory.unlink(spec.dest, &spec.name)?;
        base::remove(ctx)
    }
}

/// Relative link targets are taken from the feature's install directory
fn anchor(ctx: &FormulaContext<'_>, path: &Path) -> PathBuf {
    if path.is_relative() {
        ctx.install_directory().join(path)
    } else {
        path.to_path_buf()
    }
}
