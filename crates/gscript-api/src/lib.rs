//! Apps Script Execution API client
//!
//! Wraps the one RPC this tool needs: `scripts.run`, which executes a named
//! function in an Apps Script project and returns either a result value or
//! the script's own error with its stack trace. A script throwing is a
//! normal negative outcome here, decoded from a 2xx response — only
//! transport and API-layer faults surface as `Err`.

pub mod client;
pub mod error;
pub mod request;

pub use client::ScriptClient;
pub use error::{Error, Result};
pub use request::{ExecutionOutcome, ExecutionRequest, StackFrame};
