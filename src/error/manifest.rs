//! Manifest errors

use super::RiggerError;

/// Creates a manifest parse error pointing at a line
pub fn parse_failed(
    source_name: impl Into<String>,
    line: usize,
    message: impl Into<String>,
) -> RiggerError {
    RiggerError::ManifestParse {
        source_name: source_name.into(),
        line,
        message: message.into(),
    }
}

/// Creates a manifest read failed error
pub fn read_failed(source_name: impl Into<String>, reason: impl Into<String>) -> RiggerError {
    RiggerError::ManifestRead {
        source_name: source_name.into(),
        reason: reason.into(),
    }
}

/// Creates a manifest fetch failed error
pub fn fetch_failed(url: impl Into<String>, reason: impl Into<String>) -> RiggerError {
    RiggerError::ManifestFetch {
        url: url.into(),
        reason: reason.into(),
    }
}

/// Creates a param not found error
pub fn param_not_found(section: impl Into<String>, key: impl Into<String>) -> RiggerError {
    RiggerError::ParamNotFound {
        section: section.into(),
        key: key.into(),
    }
}

/// Creates a section not found error
pub fn section_not_found(section: impl Into<String>) -> RiggerError {
    RiggerError::SectionNotFound {
        section: section.into(),
    }
}
