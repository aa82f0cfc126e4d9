//! Credential acquisition
//!
//! Orchestrates the credential lifecycle for one run: load the persisted
//! credential, reuse it when valid, refresh it when expired, and fall back
//! to the interactive flow when nothing usable remains. Every refreshed or
//! newly issued credential is persisted before being returned, so the next
//! run starts from the newest token material.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::client_secret::ClientSecret;
use crate::credentials::{CredentialStore, StoredCredential};
use crate::error::{Error, Result};
use crate::flow;
use crate::token::{self, TokenResponse};

/// Manages one credential file and the client-secret file behind it.
pub struct CredentialManager {
    http: reqwest::Client,
    store: CredentialStore,
    client_secret_path: PathBuf,
}

impl CredentialManager {
    pub fn new(http: reqwest::Client, client_secret_path: PathBuf, credential_path: PathBuf) -> Self {
        Self {
            http,
            store: CredentialStore::new(credential_path),
            client_secret_path,
        }
    }

    /// Obtain a credential whose granted scopes cover `required_scopes`.
    ///
    /// Resolution order:
    /// 1. A cached, scope-satisfying, unexpired credential is returned
    ///    unchanged with no network traffic.
    /// 2. An expired one with a refresh token is refreshed against its
    ///    stored token endpoint; a rejected refresh falls through rather
    ///    than failing the run.
    /// 3. Otherwise the interactive consent flow runs, which requires the
    ///    client-secret file (`MissingClientSecret` when absent).
    ///
    /// A cached credential granted fewer scopes than required is discarded
    /// outright — refreshing it would reproduce the same insufficient
    /// grant, so only re-authorization helps.
    pub async fn acquire(&self, required_scopes: &[String]) -> Result<StoredCredential> {
        let cached = match self.store.load().await {
            Ok(c) => c,
            Err(Error::CredentialParse(msg)) => {
                warn!(error = %msg, "credential file unreadable, re-authorizing");
                None
            }
            Err(e) => return Err(e),
        };

        if let Some(credential) = cached {
            if !credential.satisfies_scopes(required_scopes) {
                warn!(
                    granted = credential.scopes.len(),
                    required = required_scopes.len(),
                    "cached credential is missing required scopes, re-authorizing"
                );
            } else if !credential.is_expired(now_millis()) {
                info!("cached credential is valid");
                return Ok(credential);
            } else if let Some(refresh) = credential.refresh.clone() {
                info!("cached credential expired, refreshing");
                match token::refresh_token(
                    &self.http,
                    &credential.token_uri,
                    &credential.client_id,
                    credential.client_secret.expose(),
                    &refresh,
                )
                .await
                {
                    Ok(response) => {
                        let refreshed = merge_refresh(credential, response);
                        self.store.save(&refreshed).await?;
                        return Ok(refreshed);
                    }
                    Err(e) => {
                        warn!(error = %e, "token refresh failed, falling back to re-authorization");
                    }
                }
            } else {
                info!("cached credential expired with no refresh token, re-authorizing");
            }
        }

        let secret = ClientSecret::load(&self.client_secret_path).await?;
        let response = flow::authorize(&self.http, &secret, required_scopes).await?;
        let credential = issued_credential(&secret, response, required_scopes);
        self.store.save(&credential).await?;
        Ok(credential)
    }
}

/// Fold a refresh response into an existing credential.
///
/// Google usually omits `refresh_token` and `scope` on refresh; the prior
/// values carry over.
fn merge_refresh(previous: StoredCredential, response: TokenResponse) -> StoredCredential {
    let granted = response.granted_scopes();
    StoredCredential {
        credential_type: previous.credential_type,
        access: response.access_token,
        refresh: response.refresh_token.or(previous.refresh),
        expires: now_millis() + response.expires_in * 1000,
        scopes: if granted.is_empty() {
            previous.scopes
        } else {
            granted
        },
        client_id: previous.client_id,
        client_secret: previous.client_secret,
        token_uri: previous.token_uri,
    }
}

/// Build the stored form of a freshly issued credential.
fn issued_credential(
    secret: &ClientSecret,
    response: TokenResponse,
    required_scopes: &[String],
) -> StoredCredential {
    let granted = response.granted_scopes();
    StoredCredential {
        credential_type: "authorized_user".into(),
        access: response.access_token,
        refresh: response.refresh_token,
        expires: now_millis() + response.expires_in * 1000,
        scopes: if granted.is_empty() {
            required_scopes.to_vec()
        } else {
            granted
        },
        client_id: secret.client_id.clone(),
        client_secret: secret.client_secret.clone(),
        token_uri: secret.token_uri.clone(),
    }
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
