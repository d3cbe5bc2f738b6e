//! Updating existing checkouts

use std::path::Path;

use git2::{Repository, build::CheckoutBuilder};
use tracing::{debug, info};

use super::clone::fetch_options;
use super::error::interpret_git_error;
use crate::error::{self, Result};

/// Outcome of [`fast_forward`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    UpToDate,
    FastForwarded,
}

fn current_branch(repo: &Repository) -> Result<String> {
    let head = repo.head()?;
    head.shorthand()
        .filter(|_| head.is_branch())
        .map(str::to_string)
        .ok_or_else(|| error::git::operation_failed("HEAD is not on a branch"))
}

/// URL of the `origin` remote of the repository at `path`
#[cfg(test)]
pub fn origin_url(path: &Path) -> Option<String> {
    let repo = Repository::open(path).ok()?;
    let remote = repo.find_remote("origin").ok()?;
    remote.url().map(str::to_string)
}

/// Fetch `branch` (default: the checked out branch) from `origin` and
/// fast-forward the local branch
///
/// # Errors
///
/// Returns `GitOperationFailed` when the repository cannot be opened or
/// fetched, or when local history has diverged from the remote.
pub fn fast_forward(path: &Path, branch: Option<&str>) -> Result<Pull> {
    let repo = Repository::open(path).map_err(|e| {
        error::git::operation_failed(format!(
            "Failed to open repository at '{}': {}",
            path.display(),
            e.message()
        ))
    })?;

    let branch = match branch {
        Some(branch) => branch.to_string(),
        None => current_branch(&repo)?,
    };
    let branch = branch.as_str();

    let mut remote = repo.find_remote("origin")?;
    remote
        .fetch(&[branch], Some(&mut fetch_options()), None)
        .map_err(|e| error::git::operation_failed(interpret_git_error(&e)))?;

    let fetch_head = repo.find_reference("FETCH_HEAD")?;
    let incoming = repo.reference_to_annotated_commit(&fetch_head)?;
    let (analysis, _) = repo.merge_analysis(&[&incoming])?;

    if analysis.is_up_to_date() {
        debug!(path = %path.display(), "checkout already up to date");
        return Ok(Pull::UpToDate);
    }
    if !analysis.is_fast_forward() {
        return Err(error::git::operation_failed(format!(
            "Local branch '{branch}' has diverged from origin; refusing to overwrite"
        )));
    }

    let refname = format!("refs/heads/{branch}");
    match repo.find_reference(&refname) {
        Ok(mut reference) => {
            reference.set_target(incoming.id(), "rigger: fast-forward")?;
        }
        Err(_) => {
            repo.reference(&refname, incoming.id(), true, "rigger: fast-forward")?;
        }
    }
    repo.set_head(&refname)?;
    repo.checkout_head(Some(CheckoutBuilder::default().force()))?;

    info!(path = %path.display(), branch = %branch, "fast-forwarded checkout");
    Ok(Pull::FastForwarded)
}
