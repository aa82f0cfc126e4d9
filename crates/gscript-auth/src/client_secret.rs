//! Client-secret configuration file
//!
//! Parses the `client_secret.json` file downloaded from the Google Cloud
//! console when creating an OAuth client. The file wraps the actual config
//! in an `installed` (desktop app) or `web` object; both shapes are
//! accepted. Externally provisioned and read-only — this system never
//! writes it.

use std::path::Path;

use common::Secret;
use serde::Deserialize;
use tracing::debug;

use crate::constants::{AUTHORIZE_ENDPOINT, TOKEN_ENDPOINT};
use crate::error::{Error, Result};

/// OAuth client configuration for initiating the authorization flow.
///
/// `client_secret` is not actually secret for installed apps (it ships
/// with the binary in Google's model), but it is still kept out of logs.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: Secret<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

/// On-disk wrapper: Google nests the config under `installed` or `web`.
#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

fn default_auth_uri() -> String {
    AUTHORIZE_ENDPOINT.to_owned()
}

fn default_token_uri() -> String {
    TOKEN_ENDPOINT.to_owned()
}

impl ClientSecret {
    /// Load the client secret from a JSON file.
    ///
    /// A missing file is `Error::MissingClientSecret` — the one fatal,
    /// user-remediable configuration error — so callers can render
    /// remediation guidance instead of a bare I/O failure.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingClientSecret(path.display().to_string()));
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Io(format!("reading client secret file: {e}")))?;
        Self::parse(&contents).inspect(|secret| {
            debug!(path = %path.display(), client_id = %secret.client_id, "loaded client secret");
        })
    }

    /// Parse the JSON body of a client-secret file.
    pub fn parse(contents: &str) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(contents)
            .map_err(|e| Error::CredentialParse(format!("parsing client secret file: {e}")))?;

        file.installed.or(file.web).ok_or_else(|| {
            Error::CredentialParse(
                "client secret file has neither an 'installed' nor a 'web' section".into(),
            )
        })
    }
}
