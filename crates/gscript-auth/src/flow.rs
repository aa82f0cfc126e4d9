//! Interactive installed-app authorization flow
//!
//! Binds a loopback listener on an ephemeral port, sends the user to
//! Google's consent page in their browser, and blocks until the redirect
//! lands on the listener with an authorization code (or a denial). The
//! code is then exchanged for tokens. Strictly single-invocation: one
//! listener, one callback, no reentry.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;

use crate::client_secret::ClientSecret;
use crate::error::{Error, Result};
use crate::pkce;
use crate::token::{self, TokenResponse};

/// Page shown in the browser after a successful authorization.
const SUCCESS_PAGE: &str = "<html><body><h1>Authorization complete</h1>\
<p>You can close this tab and return to the terminal.</p></body></html>";

/// Page shown when the callback carried an error or a bad state.
const FAILURE_PAGE: &str = "<html><body><h1>Authorization failed</h1>\
<p>Return to the terminal for details.</p></body></html>";

/// Run the full interactive flow and return the issued tokens.
///
/// Opens the user's browser (falling back to printing the URL when that
/// fails, e.g. on a headless host) and blocks until the consent redirect
/// arrives. Denied consent or a state mismatch is `AuthorizationDenied`.
pub async fn authorize(
    client: &reqwest::Client,
    secret: &ClientSecret,
    scopes: &[String],
) -> Result<TokenResponse> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|e| Error::Io(format!("binding loopback listener: {e}")))?;
    let port = listener
        .local_addr()
        .map_err(|e| Error::Io(format!("reading listener address: {e}")))?
        .port();
    let redirect_uri = format!("http://127.0.0.1:{port}");

    let verifier = pkce::generate_verifier();
    let challenge = pkce::compute_challenge(&verifier);
    let state = generate_state();
    let url = pkce::build_authorization_url(secret, &redirect_uri, scopes, &state, &challenge);

    info!(port, "waiting for authorization callback");
    if webbrowser::open(&url).is_err() {
        warn!("could not launch a browser, open the URL manually");
    }
    eprintln!("Visit this URL to authorize the application:\n\n{url}\n");

    let code = wait_for_callback(&listener, &state).await?;
    token::exchange_code(client, secret, &code, &verifier, &redirect_uri).await
}

/// Opaque CSRF nonce for the `state` parameter.
fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Accept connections until one carries the consent redirect, then return
/// the authorization code.
///
/// Browsers may hit the listener with unrelated requests (favicon); those
/// get a 404 and the wait continues. The redirect itself always lands on
/// the root path.
pub async fn wait_for_callback(listener: &TcpListener, expected_state: &str) -> Result<String> {
    loop {
        let (mut stream, peer) = listener
            .accept()
            .await
            .map_err(|e| Error::Io(format!("accepting callback connection: {e}")))?;
        debug!(%peer, "callback connection");

        let target = match read_request_target(&mut stream).await {
            Ok(t) => t,
            Err(e) => {
                debug!(error = %e, "unreadable callback request, waiting for another");
                continue;
            }
        };

        let Some(query) = target.strip_prefix("/?") else {
            respond(&mut stream, "404 Not Found", "").await;
            continue;
        };

        match parse_callback_query(query, expected_state) {
            Ok(code) => {
                respond(&mut stream, "200 OK", SUCCESS_PAGE).await;
                return Ok(code);
            }
            Err(e) => {
                respond(&mut stream, "200 OK", FAILURE_PAGE).await;
                return Err(e);
            }
        }
    }
}

/// Read the request target (path + query) from the HTTP request line.
///
/// Keeps reading until the first CRLF so a request line split across TCP
/// segments cannot yield a truncated authorization code.
async fn read_request_target(stream: &mut TcpStream) -> Result<String> {
    // A redirect request line fits well within 8 KiB; anything longer is
    // not ours
    const MAX_REQUEST_BYTES: usize = 8192;

    let mut buf: Vec<u8> = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    while !buf.windows(2).any(|w| w == b"\r\n") {
        if buf.len() >= MAX_REQUEST_BYTES {
            return Err(Error::Io("callback request line too long".into()));
        }
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| Error::Io(format!("reading callback request: {e}")))?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let request = String::from_utf8_lossy(&buf);

    let mut parts = request.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) => Ok(target.to_owned()),
        _ => Err(Error::Io("malformed callback request line".into())),
    }
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len(),
    );
    // The authorization outcome is already decided; a write failure only
    // costs the browser its status page
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        debug!(error = %e, "failed to write callback response");
    }
}

/// Extract the authorization code from the redirect query string.
///
/// `error=access_denied` (user clicked cancel) and a `state` mismatch are
/// both `AuthorizationDenied`.
pub fn parse_callback_query(query: &str, expected_state: &str) -> Result<String> {
    let mut code = None;
    let mut state = None;
    let mut error = None;

    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        match key {
            "code" => code = Some(percent_decode(value)),
            "state" => state = Some(percent_decode(value)),
            "error" => error = Some(percent_decode(value)),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(Error::AuthorizationDenied(format!(
            "authorization server returned '{error}'"
        )));
    }

    if state.as_deref() != Some(expected_state) {
        return Err(Error::AuthorizationDenied(
            "callback state does not match the request (possible CSRF)".into(),
        ));
    }

    code.filter(|c| !c.is_empty())
        .ok_or_else(|| Error::AuthorizationDenied("callback carried no authorization code".into()))
}

/// Decode percent-escapes and `+` in a query parameter value.
fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                if let Some(hex) = value.get(i + 1..i + 3)
                    && let Ok(byte) = u8::from_str_radix(hex, 16)
                {
                    out.push(byte);
                    i += 3;
                    continue;
                }
                out.push(b'%');
                i += 1;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
