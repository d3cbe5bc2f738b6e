//! `git` formula: keep a repository checkout in the install directory
//!
//! ```text
//! [dotfiles]
//! formula = git
//! url = https://github.com/me/dotfiles.git
//! branch = main
//! ```
//!
//! Update with the same `url` and `branch` only fast-forwards the existing
//! checkout. Changing either replaces the checkout with a fresh clone.

use tracing::{debug, info};

use super::{Formula, FormulaContext, base};
use crate::error::Result;
use crate::git;

#[derive(Debug, Default)]
pub struct GitFormula;

impl GitFormula {
    fn fresh_clone(ctx: &mut FormulaContext<'_>) -> Result<()> {
        let url = ctx.require("url")?;
        let branch = ctx.option("branch");
        ctx.directory.remove_feature(ctx.name)?;
        git::clone(&url, &ctx.install_directory(), branch.as_deref())?;
        Ok(())
    }
}

impl Formula for GitFormula {
    fn kind(&self) -> &'static str {
        "git"
    }

    fn required_options(&self) -> &'static [&'static str] {
        &["url"]
    }

    fn valid_options(&self) -> &'static [&'static str] {
        &["branch"]
    }

    fn install(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        Self::fresh_clone(ctx)?;
        base::install(ctx)
    }

    fn update(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        let checkout = ctx.install_directory();
        if ctx.option_changed("url") || ctx.option_changed("branch") || !checkout.join(".git").exists() {
            info!(feature = %ctx.name, "repository changed, cloning again");
            Self::fresh_clone(ctx)?;
        } else {
            let branch = ctx.option("branch");
            if git::fast_forward(&checkout, branch.as_deref())? == git::Pull::UpToDate {
                debug!(feature = %ctx.name, "checkout already up to date");
            }
        }
        base::update(ctx)
    }

    fn remove(&mut self, ctx: &mut FormulaContext<'_>) -> Result<()> {
        ctx.directory.remove_feature(ctx.name)?;
        base::remove(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{FormulaHarness, create_git_repo_with_commit};

    fn manifest(url: &str) -> String {
        format!("[repo]\nformula = git\nurl = {url}\n")
    }

    #[test]
    fn test_install_clones() {
        let (_upstream, url) = create_git_repo_with_commit("README.md", "hello");
        let mut harness = FormulaHarness::target_only(&manifest(&url), "repo");
        GitFormula.install(&mut harness.context()).unwrap();

        let checkout = harness.directory.install_directory("repo");
        assert_eq!(std::fs::read_to_string(checkout.join("README.md")).unwrap(), "hello");
    }

    #[test]
    fn test_unchanged_update_keeps_checkout() {
        let (_upstream, url) = create_git_repo_with_commit("README.md", "hello");
        let text = manifest(&url);
        let mut harness = FormulaHarness::pair(&text, &text, "repo");
        let checkout = harness.directory.install_directory("repo");
        git::clone(&url, &checkout, None).unwrap();
        std::fs::write(checkout.join("local-only"), "keep me").unwrap();

        GitFormula.update(&mut harness.context()).unwrap();
        assert!(checkout.join("local-only").exists());
    }

    #[test]
    fn test_url_change_reclones() {
        let (_old, old_url) = create_git_repo_with_commit("README.md", "old");
        let (_new, new_url) = create_git_repo_with_commit("README.md", "new");
        let mut harness = FormulaHarness::pair(&manifest(&old_url), &manifest(&new_url), "repo");
        let checkout = harness.directory.install_directory("repo");
        git::clone(&old_url, &checkout, None).unwrap();
        std::fs::write(checkout.join("local-only"), "stale").unwrap();

        GitFormula.update(&mut harness.context()).unwrap();
        assert!(!checkout.join("local-only").exists());
        assert_eq!(std::fs::read_to_string(checkout.join("README.md")).unwrap(), "new");
        assert_eq!(git::origin_url(&checkout), Some(new_url));
    }

    #[test]
    fn test_remove_deletes_checkout() {
        let (_upstream, url) = create_git_repo_with_commit("README.md", "hello");
        let mut harness = FormulaHarness::source_only(&manifest(&url), "repo");
        let checkout = harness.directory.install_directory("repo");
        git::clone(&url, &checkout, None).unwrap();

        GitFormula.remove(&mut harness.context()).unwrap();
        assert!(!checkout.exists());
    }
}
