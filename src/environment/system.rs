//! Host system description used by `systems` allow-lists

use std::fmt;

/// Operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Osx,
    Linux,
    Windows,
    Other,
}

impl OsFamily {
    /// Detect the family at compile time
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::Osx
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Other
        }
    }

    /// Names a `systems` entry may use for this family
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Osx => &["osx", "macos", "darwin", "mac"],
            Self::Linux => &["linux"],
            Self::Windows => &["windows", "win32"],
            Self::Other => &[],
        }
    }
}

impl fmt::Display for OsFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Osx => "osx",
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// The machine features are installed on
#[derive(Debug, Clone)]
pub struct System {
    pub family: OsFamily,
    pub hostname: String,
}

impl System {
    /// Gather current system information
    pub fn current() -> Self {
        Self {
            family: OsFamily::current(),
            hostname: whoami::fallible::hostname().unwrap_or_else(|_| "localhost".to_string()),
        }
    }

    #[cfg(test)]
    pub fn with_family(family: OsFamily) -> Self {
        Self {
            family,
            hostname: "localhost".to_string(),
        }
    }

    /// Check a comma-separated `systems` allow-list, case-insensitively
    pub fn is_allowed(&self, systems: &str) -> bool {
        let aliases = self.family.aliases();
        systems
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .any(|s| aliases.contains(&s.as_str()))
    }
}
