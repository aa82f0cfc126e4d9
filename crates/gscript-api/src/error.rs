//! Error types for Apps Script API operations

/// Errors from Apps Script API operations.
///
/// These are transport/API-layer faults only. A script-level failure
/// (the remote function threw) is not an error here — it is the
/// `ExecutionOutcome::ScriptFailure` variant.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Apps Script API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid execution response: {0}")]
    ResponseParse(String),
}

/// Result alias for API operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_status_and_body() {
        let err = Error::Api {
            status: 403,
            body: "PERMISSION_DENIED".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("403"), "got: {msg}");
        assert!(msg.contains("PERMISSION_DENIED"), "got: {msg}");
    }
}
