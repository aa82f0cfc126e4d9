//! Google OAuth authentication library
//!
//! Provides the installed-app OAuth flow (PKCE + loopback redirect), token
//! exchange/refresh, and credential file storage for the Apps Script
//! runner. This crate is a standalone library with no dependency on the
//! CLI binary — it can be tested and used independently.
//!
//! Credential flow:
//! 1. `CredentialManager::acquire()` loads `token.json` if present
//! 2. A valid, scope-satisfying credential is returned as-is
//! 3. An expired one is refreshed via `token::refresh_token()`
//! 4. Otherwise `flow::authorize()` runs the interactive consent flow
//!    using the client secret from `client_secret::ClientSecret::load()`
//! 5. The result is persisted via `credentials::CredentialStore::save()`

pub mod client_secret;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod flow;
pub mod manager;
pub mod pkce;
pub mod token;

pub use client_secret::ClientSecret;
pub use constants::*;
pub use credentials::{CredentialStore, StoredCredential};
pub use error::{Error, Result};
pub use manager::CredentialManager;
pub use pkce::{build_authorization_url, compute_challenge, generate_verifier};
pub use token::{TokenResponse, exchange_code, refresh_token};
