//! Git operation errors

use super::RiggerError;

/// Creates a git operation failed error
pub fn operation_failed(message: impl Into<String>) -> RiggerError {
    RiggerError::GitOperationFailed {
        message: message.into(),
    }
}

/// Creates a git clone failed error
pub fn clone_failed(url: impl Into<String>, reason: impl Into<String>) -> RiggerError {
    RiggerError::GitCloneFailed {
        url: url.into(),
        reason: reason.into(),
    }
}
