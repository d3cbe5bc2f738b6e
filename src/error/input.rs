//! Input registry errors

use super::RiggerError;

/// Creates an unknown input error
pub fn unknown(name: impl Into<String>) -> RiggerError {
    RiggerError::UnknownInput { name: name.into() }
}

/// Creates an input required error
pub fn required(name: impl Into<String>) -> RiggerError {
    RiggerError::InputRequired { name: name.into() }
}

/// Attaches the input name to a failed prompt
pub fn prompt_failed(name: &str, err: inquire::InquireError) -> RiggerError {
    match RiggerError::from(err) {
        RiggerError::PromptFailed { reason, .. } => RiggerError::PromptFailed {
            name: name.to_string(),
            reason,
        },
        other => other,
    }
}
