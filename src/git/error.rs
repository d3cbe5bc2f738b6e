//! Git error interpretation
//!
//! Turns libgit2's terse messages into something a user can act on.

use git2::{Error, ErrorClass};

#[derive(Clone, Copy)]
enum Category {
    NotFound,
    Auth,
    Network,
    Certificate,
    Other,
}

type Check = fn(&str, ErrorClass) -> bool;

const CATEGORIES: &[(Check, Category)] = &[
    (
        |msg, _| msg.contains("not found") || msg.contains("404"),
        Category::NotFound,
    ),
    (
        |msg, _| {
            msg.contains("authentication")
                || msg.contains("credentials")
                || msg.contains("permission denied")
        },
        Category::Auth,
    ),
    (
        |msg, class| class == ErrorClass::Http && (msg.contains("certificate") || msg.contains("ssl")),
        Category::Certificate,
    ),
    (
        |msg, class| {
            class == ErrorClass::Net
                || msg.contains("connection")
                || msg.contains("timed out")
                || msg.contains("resolve")
        },
        Category::Network,
    ),
];

fn categorize(msg: &str, class: ErrorClass) -> Category {
    CATEGORIES
        .iter()
        .find(|(check, _)| check(msg, class))
        .map_or(Category::Other, |(_, category)| *category)
}

/// Interpret a git2 error as a user-facing reason
pub fn interpret_git_error(err: &Error) -> String {
    let message = err.message().to_lowercase();
    match categorize(&message, err.class()) {
        Category::NotFound => "Repository not found".to_string(),
        Category::Auth => "Authentication failed".to_string(),
        Category::Certificate => "Certificate error".to_string(),
        Category::Network => format!("Network error: {}", err.message()),
        Category::Other => err.message().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::ErrorCode;

    #[test]
    fn test_interpret_categories() {
        let not_found = Error::new(ErrorCode::NotFound, ErrorClass::Http, "remote: 404 Not Found");
        assert_eq!(interpret_git_error(&not_found), "Repository not found");

        let auth = Error::new(ErrorCode::Auth, ErrorClass::Http, "authentication required");
        assert_eq!(interpret_git_error(&auth), "Authentication failed");

        let cert = Error::new(ErrorCode::Certificate, ErrorClass::Http, "invalid SSL certificate");
        assert_eq!(interpret_git_error(&cert), "Certificate error");

        let other = Error::new(ErrorCode::GenericError, ErrorClass::Index, "index is locked");
        assert_eq!(interpret_git_error(&other), "index is locked");
    }
}
