//! Manifest source retrieval
//!
//! A manifest location is either a URL (anything with a `scheme://` prefix)
//! or a local file path. `file://` URLs are read from disk; every other
//! scheme is fetched over HTTP(S) with optional basic auth.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use reqwest::StatusCode;
use tracing::{debug, info};

use crate::error::{self, Result, RiggerError};

static URL_SCHEME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://").ok());

/// Basic auth credentials for remote manifests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Credentials {
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }
}

/// Raw manifest text plus where it came from
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Document body
    pub body: String,
    /// Canonical location recorded as `config.source`
    pub provenance: String,
    /// Directory relative `extends` paths resolve against
    pub base_dir: Option<PathBuf>,
}

/// Check if a location carries a URI scheme
pub fn is_url(location: &str) -> bool {
    URL_SCHEME
        .as_ref()
        .is_some_and(|re| re.is_match(location))
}

/// Read a manifest from a URL or local path
///
/// # Errors
///
/// `BadCredentials` on HTTP 401/403, `CertificateInvalid` when TLS
/// verification fails, `ManifestFetch` for other network failures and
/// `ManifestRead` when a local file cannot be read.
pub fn read_location(
    location: &str,
    credentials: &Credentials,
    verify_certificate: bool,
) -> Result<Fetched> {
    if let Some(path) = location.strip_prefix("file://") {
        return read_path(Path::new(path));
    }
    if is_url(location) {
        let body = fetch_url(location, credentials, verify_certificate)?;
        return Ok(Fetched {
            body,
            provenance: location.to_string(),
            base_dir: None,
        });
    }
    read_path(Path::new(location))
}

/// Resolve a location named by `extends` against the extending manifest
pub fn resolve_relative(location: &str, base_dir: Option<&Path>) -> String {
    if is_url(location) {
        return location.to_string();
    }
    let path = Path::new(location);
    match base_dir {
        Some(base) if path.is_relative() => base.join(path).display().to_string(),
        _ => location.to_string(),
    }
}

fn read_path(path: &Path) -> Result<Fetched> {
    debug!(path = %path.display(), "reading manifest");
    let body = std::fs::read_to_string(path)
        .map_err(|e| error::manifest::read_failed(path.display().to_string(), e.to_string()))?;
    let canonical = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    Ok(Fetched {
        body,
        base_dir: canonical.parent().map(Path::to_path_buf),
        provenance: canonical.display().to_string(),
    })
}

fn fetch_url(url: &str, credentials: &Credentials, verify_certificate: bool) -> Result<String> {
    info!(url = %url, "fetching manifest");

    let client = reqwest::blocking::Client::builder()
        .danger_accept_invalid_certs(!verify_certificate)
        .build()
        .map_err(|e| error::manifest::fetch_failed(url, e.to_string()))?;

    let mut request = client.get(url);
    if let Some(username) = &credentials.username {
        request = request.basic_auth(username, credentials.password.as_ref());
    }

    let response = request.send().map_err(|e| classify_send_error(url, &e))?;

    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RiggerError::BadCredentials {
            url: url.to_string(),
        }),
        status if !status.is_success() => Err(error::manifest::fetch_failed(
            url,
            format!("HTTP {status}"),
        )),
        _ => response
            .text()
            .map_err(|e| error::manifest::fetch_failed(url, e.to_string())),
    }
}

fn classify_send_error(url: &str, err: &reqwest::Error) -> RiggerError {
    let mut cause: Option<&dyn std::error::Error> = Some(err);
    while let Some(current) = cause {
        if current.to_string().to_lowercase().contains("certificate") {
            return RiggerError::CertificateInvalid {
                url: url.to_string(),
            };
        }
        cause = current.source();
    }
    error::manifest::fetch_failed(url, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/dev.cfg"));
        assert!(is_url("file:///tmp/dev.cfg"));
        assert!(is_url("git+ssh://host/x"));
        assert!(!is_url("/tmp/dev.cfg"));
        assert!(!is_url("relative/dev.cfg"));
        assert!(!is_url("C:\\dev.cfg"));
    }

    #[test]
    fn test_read_local_path_records_canonical_provenance() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dev.cfg");
        std::fs::write(&path, "[config]\n").unwrap();

        let fetched = read_location(path.to_str().unwrap(), &Credentials::default(), true).unwrap();
        assert_eq!(fetched.body, "[config]\n");
        let canonical = dunce::canonicalize(&path).unwrap();
        assert_eq!(fetched.provenance, canonical.display().to_string());
        assert_eq!(fetched.base_dir.as_deref(), canonical.parent());
    }

    #[test]
    fn test_read_file_url() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dev.cfg");
        std::fs::write(&path, "[a]\n").unwrap();

        let url = format!("file://{}", path.display());
        let fetched = read_location(&url, &Credentials::default(), true).unwrap();
        assert_eq!(fetched.body, "[a]\n");
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = read_location("/definitely/not/here.cfg", &Credentials::default(), true)
            .unwrap_err();
        assert!(matches!(err, RiggerError::ManifestRead { .. }));
    }

    #[test]
    fn test_resolve_relative() {
        let base = Path::new("/srv/manifests");
        assert_eq!(
            resolve_relative("base.cfg", Some(base)),
            Path::new("/srv/manifests").join("base.cfg").display().to_string()
        );
        assert_eq!(resolve_relative("/abs/base.cfg", Some(base)), "/abs/base.cfg");
        assert_eq!(
            resolve_relative("https://x/base.cfg", Some(base)),
            "https://x/base.cfg"
        );
        assert_eq!(resolve_relative("base.cfg", None), "base.cfg");
    }
}
