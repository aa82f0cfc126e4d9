//! Apps Script remote runner
//!
//! Single-binary CLI that:
//! 1. Resolves configuration from the command line and environment
//! 2. Acquires a Google OAuth credential (cached, refreshed, or interactive)
//! 3. Runs one function in an Apps Script project via `scripts.run`
//! 4. Prints the result or the script's error and stack trace
//!
//! Exit codes: 0 success, 1 the script itself threw, 2 configuration
//! error (missing script id, missing or corrupt client secret),
//! 3 authorization failure, 4 transport/API fault.

mod config;

use std::process::ExitCode;

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gscript_api::{ExecutionOutcome, ExecutionRequest, ScriptClient};
use gscript_auth::{CredentialManager, REQUIRED_SCOPES};

use crate::config::Config;

/// Everything that can stop a run short of a decoded execution outcome.
#[derive(Debug, thiserror::Error)]
enum RunError {
    #[error("{0}")]
    Config(#[from] common::Error),

    #[error("{0}")]
    Auth(#[from] gscript_auth::Error),

    #[error("{0}")]
    Api(#[from] gscript_api::Error),
}

impl RunError {
    /// Exit codes: 2 configuration, 3 authorization, 4 transport/API.
    ///
    /// A missing or unparseable client secret is a configuration problem
    /// (the user has to provision a valid file), not an authorization
    /// failure. Parse errors only reach this point from the client-secret
    /// file — a corrupt credential file is discarded and re-authorized
    /// inside the manager.
    fn exit_code(&self) -> u8 {
        match self {
            RunError::Config(_) => 2,
            RunError::Auth(
                gscript_auth::Error::MissingClientSecret(_)
                | gscript_auth::Error::CredentialParse(_),
            ) => 2,
            RunError::Auth(_) => 3,
            RunError::Api(_) => 4,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Diagnostics go to stderr via tracing with LOG_LEVEL / RUST_LOG
    // support; primary output (results, script errors) prints directly
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args).await {
        Ok(outcome) => ExitCode::from(report_outcome(outcome)),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

/// One full invocation: config → credential → RPC.
async fn run(args: &[String]) -> Result<ExecutionOutcome, RunError> {
    let config = Config::resolve(args)?;
    info!(
        script_id = %config.script_id,
        function = %config.function,
        "configuration resolved"
    );

    let http = reqwest::Client::new();
    let manager = CredentialManager::new(
        http.clone(),
        config.client_secret_path.clone(),
        config.credential_path.clone(),
    );
    let scopes: Vec<String> = REQUIRED_SCOPES.iter().map(|s| s.to_string()).collect();
    let credential = manager.acquire(&scopes).await?;

    println!(
        "Executing function '{}' in script {}...",
        config.function, config.script_id
    );

    let client = ScriptClient::new(http);
    let request = ExecutionRequest::new(config.function, config.parameters);
    let outcome = client
        .run(&credential.access, &config.script_id, &request)
        .await?;
    Ok(outcome)
}

/// Render the execution outcome and pick the exit code.
///
/// A script-level error is printed to stderr in the shape the Apps Script
/// editor uses (message plus tab-indented `function: line` frames) and
/// exits 1 — it is the remote function's failure, not this tool's.
fn report_outcome(outcome: ExecutionOutcome) -> u8 {
    match outcome {
        ExecutionOutcome::Success { result } => {
            println!("Script executed successfully!");
            if let Some(result) = result {
                println!("Script response:");
                println!("{result}");
            }
            0
        }
        ExecutionOutcome::ScriptFailure { message, stack } => {
            eprintln!("Script error message: {message}");
            if !stack.is_empty() {
                eprintln!("Script error stacktrace:");
                for frame in &stack {
                    eprintln!(
                        "\t{}: {}",
                        frame.function.as_deref().unwrap_or("<anonymous>"),
                        frame
                            .line_number
                            .map(|n| n.to_string())
                            .unwrap_or_else(|| "?".into())
                    );
                }
            }
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_distinguish_error_kinds() {
        let config = RunError::Config(common::Error::Config("missing script id".into()));
        assert_eq!(config.exit_code(), 2);

        let missing_secret =
            RunError::Auth(gscript_auth::Error::MissingClientSecret("creds.json".into()));
        assert_eq!(missing_secret.exit_code(), 2);

        // A client-secret file that exists but does not parse is the same
        // remediate-your-configuration case as a missing one
        let corrupt_secret = RunError::Auth(gscript_auth::Error::CredentialParse(
            "parsing client secret file: expected value at line 1".into(),
        ));
        assert_eq!(corrupt_secret.exit_code(), 2);

        let denied = RunError::Auth(gscript_auth::Error::AuthorizationDenied("denied".into()));
        assert_eq!(denied.exit_code(), 3);

        let api = RunError::Api(gscript_api::Error::Api {
            status: 403,
            body: "PERMISSION_DENIED".into(),
        });
        assert_eq!(api.exit_code(), 4);
    }

    #[test]
    fn missing_client_secret_message_carries_remediation() {
        let err = RunError::Auth(gscript_auth::Error::MissingClientSecret(
            "creds.json".into(),
        ));
        let msg = err.to_string();
        assert!(msg.contains("creds.json"));
        assert!(msg.contains("Google Cloud console"), "got: {msg}");
    }

    #[test]
    fn script_failure_exits_one() {
        let code = report_outcome(ExecutionOutcome::ScriptFailure {
            message: "Sheet not found".into(),
            stack: vec![],
        });
        assert_eq!(code, 1);
    }

    #[test]
    fn success_exits_zero() {
        assert_eq!(report_outcome(ExecutionOutcome::Success { result: None }), 0);
    }
}
