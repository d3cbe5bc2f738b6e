//! Dependency resolution for manifest features
//!
//! This module handles:
//! - Parsing `depends` declarations
//! - Ordering features so dependencies run before their dependents
//! - Circular and dangling dependency detection

pub mod sort;

pub use sort::{Node, order, parse_depends};
