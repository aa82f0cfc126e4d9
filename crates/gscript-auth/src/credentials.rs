//! Credential storage for OAuth tokens
//!
//! Manages the single JSON credential file (`token.json` by convention).
//! Writes use atomic temp-file + rename to prevent corruption on crash and
//! the file is created 0600 since it holds token material. The file is
//! overwritten wholesale on every re-auth or refresh; concurrent runs of
//! the tool against the same path are an accepted race (single-user,
//! single-invocation usage).

use std::path::{Path, PathBuf};

use common::Secret;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::EXPIRY_LEEWAY_MILLIS;
use crate::error::{Error, Result};

/// The persisted OAuth credential.
///
/// `expires` is a unix timestamp in milliseconds (absolute, not a delta),
/// computed at storage time from `TokenResponse.expires_in` plus the
/// current time; `0` means no known expiry. The client id/secret and token
/// endpoint are stored alongside the tokens so a refresh never needs the
/// client-secret file (matching Google's authorized-user file format).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    /// Always "authorized_user" for this tool
    #[serde(rename = "type")]
    pub credential_type: String,
    /// Current access token (Bearer token for API calls)
    pub access: String,
    /// Refresh token, absent when Google did not issue one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
    /// Expiration as unix timestamp in milliseconds
    #[serde(default)]
    pub expires: u64,
    /// Scopes the user actually granted
    #[serde(default)]
    pub scopes: Vec<String>,
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub token_uri: String,
}

impl StoredCredential {
    /// Whether the access token is expired (or expiring within the leeway
    /// window) at `now_millis`. A credential with no expiry never expires.
    pub fn is_expired(&self, now_millis: u64) -> bool {
        self.expires != 0 && self.expires <= now_millis + EXPIRY_LEEWAY_MILLIS
    }

    /// Whether the granted scope set covers every required scope.
    pub fn satisfies_scopes(&self, required: &[String]) -> bool {
        required.iter().all(|s| self.scopes.contains(s))
    }
}

/// Single-credential file manager.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted credential, if any.
    ///
    /// A missing file is `Ok(None)` (first run). A file that exists but
    /// does not parse is an error — the caller decides whether to discard
    /// it and re-authorize.
    pub async fn load(&self) -> Result<Option<StoredCredential>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no credential file, first run");
            return Ok(None);
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::Io(format!("reading credential file: {e}")))?;
        let credential: StoredCredential = serde_json::from_str(&contents)
            .map_err(|e| Error::CredentialParse(format!("parsing credential file: {e}")))?;

        info!(path = %self.path.display(), "loaded credential");
        Ok(Some(credential))
    }

    /// Persist a credential, overwriting any prior file.
    ///
    /// Uses atomic write (temp file + rename) to prevent corruption.
    /// File permissions are set to 0600 (owner read/write only).
    pub async fn save(&self, credential: &StoredCredential) -> Result<()> {
        let json = serde_json::to_string_pretty(credential)
            .map_err(|e| Error::CredentialParse(format!("serializing credential: {e}")))?;

        let dir = match self.path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let tmp_path = dir.join(format!(".credential.tmp.{}", std::process::id()));

        tokio::fs::write(&tmp_path, json.as_bytes())
            .await
            .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;

        // Set 0600 permissions (unix only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            tokio::fs::set_permissions(&tmp_path, perms)
                .await
                .map_err(|e| Error::Io(format!("setting credential file permissions: {e}")))?;
        }

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))?;

        info!(path = %self.path.display(), "persisted credential");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_credential(suffix: &str) -> StoredCredential {
        StoredCredential {
            credential_type: "authorized_user".into(),
            access: format!("at_{suffix}"),
            refresh: Some(format!("rt_{suffix}")),
            expires: 1735500000000,
            scopes: vec![
                "https://www.googleapis.com/auth/script.projects".into(),
                "https://www.googleapis.com/auth/spreadsheets".into(),
            ],
            client_id: "id.apps.googleusercontent.com".into(),
            client_secret: Secret::new("GOCSPX-test".into()),
            token_uri: "https://oauth2.googleapis.com/token".into(),
        }
    }

    #[tokio::test]
    async fn roundtrip_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token.json"));

        store.save(&test_credential("1")).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.access, "at_1");
        assert_eq!(loaded.refresh.as_deref(), Some("rt_1"));
        assert_eq!(loaded.credential_type, "authorized_user");
        assert_eq!(loaded.scopes.len(), 2);
        assert_eq!(loaded.client_secret.expose(), "GOCSPX-test");
    }

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token.json"));
        assert!(store.load().await.unwrap().is_none());
        // Load never creates the file
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        tokio::fs::write(&path, "{ truncated").await.unwrap();

        let store = CredentialStore::new(path);
        let result = store.load().await;
        assert!(matches!(result, Err(Error::CredentialParse(_))));
    }

    #[tokio::test]
    async fn save_overwrites_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token.json"));

        store.save(&test_credential("old")).await.unwrap();
        let before = tokio::fs::read_to_string(store.path()).await.unwrap();

        store.save(&test_credential("new")).await.unwrap();
        let after = tokio::fs::read_to_string(store.path()).await.unwrap();

        assert_ne!(before, after);
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.access, "at_new");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_permissions_are_0600() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token.json"));
        store.save(&test_credential("1")).await.unwrap();

        let metadata = tokio::fs::metadata(store.path()).await.unwrap();
        let mode = metadata.permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "credential file must be 0600, got {mode:o}");
    }

    #[tokio::test]
    async fn missing_refresh_token_roundtrips_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token.json"));

        let mut credential = test_credential("1");
        credential.refresh = None;
        store.save(&credential).await.unwrap();

        let json = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert!(!json.contains("\"refresh\""));

        let loaded = store.load().await.unwrap().unwrap();
        assert!(loaded.refresh.is_none());
    }

    #[test]
    fn expiry_uses_leeway_window() {
        let mut credential = test_credential("1");
        credential.expires = 1_000_000;

        // Well before expiry
        assert!(!credential.is_expired(1_000_000 - EXPIRY_LEEWAY_MILLIS - 1));
        // Inside the leeway window
        assert!(credential.is_expired(1_000_000 - EXPIRY_LEEWAY_MILLIS + 1));
        // Past expiry
        assert!(credential.is_expired(2_000_000));
    }

    #[test]
    fn zero_expiry_never_expires() {
        let mut credential = test_credential("1");
        credential.expires = 0;
        assert!(!credential.is_expired(u64::MAX - EXPIRY_LEEWAY_MILLIS));
    }

    #[test]
    fn scope_superset_check() {
        let credential = test_credential("1");
        let spreadsheets = vec!["https://www.googleapis.com/auth/spreadsheets".to_owned()];
        assert!(credential.satisfies_scopes(&spreadsheets));

        let drive = vec!["https://www.googleapis.com/auth/drive".to_owned()];
        assert!(!credential.satisfies_scopes(&drive));

        assert!(credential.satisfies_scopes(&[]));
    }
}
