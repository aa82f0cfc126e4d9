//! Execution request and response wire types
//!
//! Mirrors the `scripts.run` wire format: the request is
//! `{function, parameters, devMode}` and the response is a long-running
//! Operation envelope that is already `done` for synchronous runs. The
//! envelope carries either `response.result` (success) or `error.details`
//! with the script's own error message and stack trace.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One `scripts.run` invocation. Constructed fresh per run, immutable.
///
/// `dev_mode: true` runs the latest saved code rather than the most
/// recent deployment.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub function: String,
    pub parameters: Vec<Value>,
    pub dev_mode: bool,
}

impl ExecutionRequest {
    pub fn new(function: impl Into<String>, parameters: Vec<Value>) -> Self {
        Self {
            function: function.into(),
            parameters,
            dev_mode: true,
        }
    }
}

/// One frame of a script stack trace: function name and line number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    #[serde(default)]
    pub function: Option<String>,
    #[serde(default)]
    pub line_number: Option<u64>,
}

/// Outcome of a completed execution.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// The function ran to completion; `result` is absent for void returns.
    Success { result: Option<Value> },
    /// The function itself threw. Message and stack come from the first
    /// error detail, matching what the Apps Script editor would show.
    ScriptFailure {
        message: String,
        stack: Vec<StackFrame>,
    },
}

/// The Operation envelope returned by `scripts.run`.
#[derive(Debug, Deserialize)]
pub(crate) struct Operation {
    #[serde(default)]
    pub error: Option<OperationError>,
    #[serde(default)]
    pub response: Option<OperationResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OperationError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub script_stack_trace_elements: Vec<StackFrame>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OperationResponse {
    #[serde(default)]
    pub result: Option<Value>,
}

impl Operation {
    /// Collapse the envelope into an outcome.
    pub(crate) fn into_outcome(self) -> ExecutionOutcome {
        match self.error {
            Some(error) => {
                let mut details = error.details;
                let detail = if details.is_empty() {
                    None
                } else {
                    Some(details.swap_remove(0))
                };
                let message = detail
                    .as_ref()
                    .and_then(|d| d.error_message.clone())
                    .or(error.message)
                    .unwrap_or_else(|| "script execution failed".into());
                let stack = detail
                    .map(|d| d.script_stack_trace_elements)
                    .unwrap_or_default();
                ExecutionOutcome::ScriptFailure { message, stack }
            }
            None => ExecutionOutcome::Success {
                result: self.response.and_then(|r| r.result),
            },
        }
    }
}
