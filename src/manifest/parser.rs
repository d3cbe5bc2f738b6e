//! Manifest document format
//!
//! ```text
//! [config]
//! namespace = dev
//! inputs = user
//!     token?
//!
//! [checkout]
//! formula = git
//! url = https://example.com/%(config:user)s/dotfiles.git
//! ```
//!
//! - `[name]` opens a section; section names keep their case
//! - `key = value` or `key: value`; keys are lower-cased
//! - indented lines continue the previous value
//! - lines starting with `#` or `;` are comments

use indexmap::IndexMap;

use crate::error::{self, Result};

/// Key/value pairs of one section in declaration order
pub type Section = IndexMap<String, String>;

/// All sections of a document in declaration order
pub type Sections = IndexMap<String, Section>;

/// Parse manifest text into sections
///
/// # Errors
///
/// Returns `ManifestParse` with the offending line number for keys outside a
/// section, duplicate sections or keys, and lines without a separator.
pub fn parse(text: &str, source_name: &str) -> Result<Sections> {
    let mut sections = Sections::new();
    let mut current: Option<String> = None;
    let mut last_key: Option<String> = None;
    let mut pending_blank = 0usize;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if last_key.is_some() {
                pending_blank += 1;
            }
            continue;
        }
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        let indented = line.starts_with(char::is_whitespace);
        if indented {
            if let (Some(section), Some(key)) = (&current, &last_key) {
                if let Some(value) = sections.get_mut(section).and_then(|s| s.get_mut(key)) {
                    for _ in 0..pending_blank {
                        value.push('\n');
                    }
                    if !value.is_empty() || pending_blank > 0 {
                        value.push('\n');
                    }
                    value.push_str(trimmed);
                }
                pending_blank = 0;
                continue;
            }
        }
        pending_blank = 0;

        if let Some(header) = trimmed.strip_prefix('[') {
            let Some(name) = header.strip_suffix(']') else {
                return Err(error::manifest::parse_failed(
                    source_name,
                    line_no,
                    "unterminated section header",
                ));
            };
            let name = name.trim().to_string();
            if sections.contains_key(&name) {
                return Err(error::manifest::parse_failed(
                    source_name,
                    line_no,
                    format!("section [{name}] already exists"),
                ));
            }
            sections.insert(name.clone(), Section::new());
            current = Some(name);
            last_key = None;
            continue;
        }

        let Some(section) = current.as_ref() else {
            return Err(error::manifest::parse_failed(
                source_name,
                line_no,
                "key found before any [section] header",
            ));
        };

        let Some(sep) = trimmed.find(['=', ':']) else {
            return Err(error::manifest::parse_failed(
                source_name,
                line_no,
                format!("expected `key = value`, found `{trimmed}`"),
            ));
        };
        let key = trimmed[..sep].trim().to_lowercase();
        let value = trimmed[sep + 1..].trim().to_string();

        let entries = sections.entry(section.clone()).or_default();
        if entries.contains_key(&key) {
            return Err(error::manifest::parse_failed(
                source_name,
                line_no,
                format!("key '{key}' already exists in [{section}]"),
            ));
        }
        entries.insert(key.clone(), value);
        last_key = Some(key);
    }

    Ok(sections)
}

/// Render sections back into manifest text
///
/// Multi-line values are written as tab-indented continuation lines.
pub fn render(sections: &Sections) -> String {
    let mut out = String::new();
    for (name, entries) in sections {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&format!("[{name}]\n"));
        for (key, value) in entries {
            let mut lines = value.split('\n');
            let first = lines.next().unwrap_or_default();
            out.push_str(&format!("{key} = {first}\n"));
            for line in lines {
                if line.is_empty() {
                    out.push('\n');
                } else {
                    out.push('\t');
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
    }
    out
}
