//! Namespace and driver precondition errors

use super::RiggerError;

/// Creates a not installed error
pub fn not_installed(namespace: impl Into<String>) -> RiggerError {
    RiggerError::NotInstalled {
        namespace: namespace.into(),
    }
}

/// Creates a manifest required error
pub fn manifest_required(namespace: impl Into<String>) -> RiggerError {
    RiggerError::ManifestRequired {
        namespace: namespace.into(),
    }
}
