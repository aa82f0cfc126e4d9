//! The `scripts.run` HTTP client
//!
//! One synchronous round trip per invocation: POST the execution request
//! to `/v1/scripts/{script_id}:run` with a bearer token and decode the
//! Operation envelope. No retry, no client-side timeout — the run blocks
//! until the remote call completes or the transport fails.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::request::{ExecutionOutcome, ExecutionRequest, Operation};

/// Production Apps Script API endpoint.
const DEFAULT_BASE_URL: &str = "https://script.googleapis.com";

/// Authenticated client bound to the Apps Script execution API.
pub struct ScriptClient {
    http: reqwest::Client,
    base_url: String,
}

impl ScriptClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }

    /// Point the client at a different API host (tests).
    pub fn with_base_url(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Run a function in the given script project and decode the outcome.
    ///
    /// Non-2xx statuses (auth rejected, project not found, malformed call)
    /// are `Error::Api` — distinct from a script that ran and threw, which
    /// comes back as `ExecutionOutcome::ScriptFailure` inside `Ok`.
    pub async fn run(
        &self,
        access_token: &str,
        script_id: &str,
        request: &ExecutionRequest,
    ) -> Result<ExecutionOutcome> {
        let url = format!("{}/v1/scripts/{script_id}:run", self.base_url);
        debug!(%script_id, function = %request.function, "submitting execution request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Http(format!("scripts.run request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let operation = response
            .json::<Operation>()
            .await
            .map_err(|e| Error::ResponseParse(format!("decoding operation envelope: {e}")))?;

        let outcome = operation.into_outcome();
        match &outcome {
            ExecutionOutcome::Success { .. } => info!(%script_id, "script executed successfully"),
            ExecutionOutcome::ScriptFailure { message, .. } => {
                info!(%script_id, error = %message, "script reported an error")
            }
        }
        Ok(outcome)
    }
}
