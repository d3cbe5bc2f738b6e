//! Git operations for the `git` formula
//!
//! This module handles:
//! - Cloning repositories at a branch
//! - Fetching and fast-forwarding existing checkouts
//! - Authentication via git's native credential system
//!
//! Authentication is delegated entirely to git's native system:
//! - SSH agent and keys from ~/.ssh/
//! - Git credential helpers

mod auth;
mod clone;
mod error;
mod fetch;

pub use clone::clone;
pub use fetch::{Pull, fast_forward};
#[cfg(test)]
pub use fetch::origin_url;
