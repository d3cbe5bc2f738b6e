//! Git authentication callbacks
//!
//! Credentials come from git's own sources: the SSH agent, keys in
//! `~/.ssh/`, and configured credential helpers.

use git2::{Cred, CredentialType, Error, ErrorClass, ErrorCode, RemoteCallbacks};

fn auth_failed() -> Error {
    Error::new(ErrorCode::Auth, ErrorClass::Http, "authentication failed")
}

fn ssh_key_from_disk(username: &str) -> Result<Cred, Error> {
    let ssh_dir = dirs::home_dir().unwrap_or_default().join(".ssh");
    for key_name in ["id_ed25519", "id_ecdsa", "id_rsa"] {
        let private_key = ssh_dir.join(key_name);
        if !private_key.exists() {
            continue;
        }
        let public_key = ssh_dir.join(format!("{key_name}.pub"));
        let public_key = public_key.exists().then_some(public_key);
        if let Ok(cred) = Cred::ssh_key(username, public_key.as_deref(), &private_key, None) {
            return Ok(cred);
        }
    }
    Err(auth_failed())
}

fn credential_helper(url: &str, username: Option<&str>) -> Result<Cred, Error> {
    let config = git2::Config::open_default().or_else(|_| git2::Config::new())?;
    Cred::credential_helper(&config, url, username).map_err(|_| auth_failed())
}

/// Install the credential callback on `callbacks`
pub fn setup_auth_callbacks(callbacks: &mut RemoteCallbacks<'_>) {
    callbacks.credentials(|url, username_from_url, allowed| {
        if allowed.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }
        if allowed.contains(CredentialType::SSH_KEY) {
            let username = username_from_url.unwrap_or("git");
            return Cred::ssh_key_from_agent(username).or_else(|_| ssh_key_from_disk(username));
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            return credential_helper(url, username_from_url);
        }
        Err(auth_failed())
    });
}
