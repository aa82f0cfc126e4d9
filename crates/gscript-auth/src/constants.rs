//! Google OAuth constants
//!
//! Endpoint URLs and the required scope set. The client id and secret are
//! NOT constants here — Google provisions them per project in the
//! `client_secret.json` file, which also carries the endpoint URLs
//! (`auth_uri` / `token_uri`). These constants are the defaults used when
//! a client-secret file omits them and as the token endpoint recorded in
//! freshly issued credentials.

/// Authorization endpoint for the installed-app consent page
pub const AUTHORIZE_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Token endpoint for code exchange and token refresh
pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Scopes required to run a function in an Apps Script project bound to a
/// spreadsheet. This is the canonical set: a cached credential granted
/// fewer scopes is discarded and re-authorization runs.
pub const REQUIRED_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/script.projects",
    "https://www.googleapis.com/auth/spreadsheets",
];

/// Access tokens expiring within this window count as expired, so a token
/// refreshed here survives the upcoming API call.
pub const EXPIRY_LEEWAY_MILLIS: u64 = 60_000;
