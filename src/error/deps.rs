//! Dependency errors

use super::RiggerError;

/// Creates a circular dependency error
pub fn circular(node: impl Into<String>, dependency: impl Into<String>) -> RiggerError {
    RiggerError::CircularDependency {
        node: node.into(),
        dependency: dependency.into(),
    }
}

/// Creates a missing dependency error
pub fn missing(node: impl Into<String>, dependency: impl Into<String>) -> RiggerError {
    RiggerError::MissingDependency {
        node: node.into(),
        dependency: dependency.into(),
    }
}

/// Creates a duplicate node error
pub fn duplicate(name: impl Into<String>) -> RiggerError {
    RiggerError::DuplicateNode { name: name.into() }
}
