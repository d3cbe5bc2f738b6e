//! `%(key)s` placeholder formatting
//!
//! Manifest values reference other values with `%(section:key)s`. A literal
//! percent sign is written `%%`. Any other use of `%` makes the value
//! malformed, which callers treat as "leave the value alone".

use std::collections::HashMap;

/// Lookup table for placeholder names
pub type Context = HashMap<String, String>;

/// Why a value could not be formatted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// A placeholder named a key absent from the context
    MissingKey(String),
    /// A `%` that is not `%%` or a complete `%(key)s` placeholder
    Malformed,
}

/// Substitute every placeholder in `template` once
///
/// Placeholders are processed left to right and the first failure is
/// returned, so a missing key that precedes a malformed sequence is reported
/// as missing.
pub fn format(template: &str, context: &Context) -> Result<String, FormatError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(idx) = rest.find('%') {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + 1..];

        if let Some(tail) = after.strip_prefix('%') {
            out.push('%');
            rest = tail;
            continue;
        }

        let Some(inner) = after.strip_prefix('(') else {
            return Err(FormatError::Malformed);
        };
        let Some(close) = inner.find(')') else {
            return Err(FormatError::Malformed);
        };
        let key = &inner[..close];
        let Some(value) = context.get(key) else {
            return Err(FormatError::MissingKey(key.to_string()));
        };
        let Some(tail) = inner[close + 1..].strip_prefix('s') else {
            return Err(FormatError::Malformed);
        };

        out.push_str(value);
        rest = tail;
    }

    out.push_str(rest);
    Ok(out)
}

/// Whether a value contains anything `format` would act on
pub fn has_placeholders(value: &str) -> bool {
    value.contains('%')
}

/// Shell-quote a value for `|escaped` context entries
///
/// Values that cannot be quoted (embedded NUL) are passed through as-is.
pub fn escape(value: &str) -> String {
    shlex::try_quote(value).map_or_else(|_| value.to_string(), |q| q.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, &str)]) -> Context {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_plain_string_unchanged() {
        let context = ctx(&[]);
        assert_eq!(format("hello world", &context).unwrap(), "hello world");
    }

    #[test]
    fn test_substitutes_named_keys() {
        let context = ctx(&[("config:name", "world"), ("git:root_dir", "/opt/x")]);
        assert_eq!(
            format("hi %(config:name)s in %(git:root_dir)s/", &context).unwrap(),
            "hi world in /opt/x/"
        );
    }

    #[test]
    fn test_double_percent_is_literal() {
        assert_eq!(format("100%% done", &ctx(&[])).unwrap(), "100% done");
    }

    #[test]
    fn test_missing_key_reported() {
        assert_eq!(
            format("%(config:user)s", &ctx(&[])),
            Err(FormatError::MissingKey("config:user".to_string()))
        );
    }

    #[test]
    fn test_first_error_wins() {
        assert_eq!(
            format("%(nope)s 50%", &ctx(&[])),
            Err(FormatError::MissingKey("nope".to_string()))
        );
        assert_eq!(
            format("50% %(nope)s", &ctx(&[])),
            Err(FormatError::Malformed)
        );
    }

    #[test]
    fn test_malformed_sequences() {
        let context = ctx(&[("a", "1")]);
        assert_eq!(format("p4ss%w0rd", &context), Err(FormatError::Malformed));
        assert_eq!(format("trailing %", &context), Err(FormatError::Malformed));
        assert_eq!(format("%(a", &context), Err(FormatError::Malformed));
        assert_eq!(format("%(a)d", &context), Err(FormatError::Malformed));
    }

    #[test]
    fn test_escape_quotes_for_shell() {
        assert_eq!(escape("plain"), "plain");
        for value in ["two words", "it's", "$HOME; rm -rf /"] {
            let quoted = escape(value);
            assert_ne!(quoted, value);
            assert_eq!(shlex::split(&quoted), Some(vec![value.to_string()]));
        }
    }

    #[test]
    fn test_substituted_value_is_not_rescanned() {
        let context = ctx(&[("a", "%(b)s"), ("b", "x")]);
        assert_eq!(format("%(a)s", &context).unwrap(), "%(b)s");
    }
}
