//! Repository cloning

use std::path::Path;

use git2::{FetchOptions, RemoteCallbacks, Repository, build::RepoBuilder};
use tracing::info;

use super::auth::setup_auth_callbacks;
use super::error::interpret_git_error;
use crate::error::{self, Result};

pub(super) fn fetch_options<'a>() -> FetchOptions<'a> {
    let mut callbacks = RemoteCallbacks::new();
    setup_auth_callbacks(&mut callbacks);
    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);
    options
}

/// Clone `url` into `target`, checking out `branch` or the remote default
///
/// # Errors
///
/// Returns `GitCloneFailed` with an interpreted reason.
pub fn clone(url: &str, target: &Path, branch: Option<&str>) -> Result<Repository> {
    info!(url = %url, branch = ?branch, target = %target.display(), "cloning repository");

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options());
    if let Some(branch) = branch {
        builder.branch(branch);
    }
    builder
        .clone(url, target)
        .map_err(|e| error::git::clone_failed(url, interpret_git_error(&e)))
}
