//! Per-feature executor errors

use super::RiggerError;

/// Creates an unknown formula error
pub fn unknown_formula(kind: impl Into<String>) -> RiggerError {
    RiggerError::UnknownFormula { kind: kind.into() }
}

/// Creates a formula failure for a named feature
pub fn failed(feature: impl Into<String>, message: impl Into<String>) -> RiggerError {
    RiggerError::FormulaFailed {
        feature: feature.into(),
        message: message.into(),
    }
}

/// Creates a command failed error
pub fn command_failed(command: impl Into<String>, status: impl Into<String>) -> RiggerError {
    RiggerError::CommandFailed {
        command: command.into(),
        status: status.into(),
    }
}

/// Creates the aggregate error raised at the end of a run
pub fn aggregate(features: &[String]) -> RiggerError {
    RiggerError::FeatureErrors {
        count: features.len(),
        features: features.join(", "),
    }
}
