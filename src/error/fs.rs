//! File system errors

use std::path::Path;

use super::RiggerError;

/// Creates a file read failed error
pub fn read_failed(path: &Path, err: &std::io::Error) -> RiggerError {
    RiggerError::FileReadFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Creates a file write failed error
pub fn write_failed(path: &Path, err: &std::io::Error) -> RiggerError {
    RiggerError::FileWriteFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Creates an IO error
pub fn io_error(message: impl Into<String>) -> RiggerError {
    RiggerError::IoError {
        message: message.into(),
    }
}
