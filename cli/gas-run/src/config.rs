//! Configuration resolution
//!
//! Everything the run needs is resolved once at the boundary into a plain
//! `Config` and threaded through as data — no fixed global paths.
//! Precedence: CLI arg > env var > default. The script id is the single
//! positional argument, with `SCRIPT_ID` as the env fallback for
//! automated workflows.

use std::path::PathBuf;

use serde_json::Value;

/// Default target function: builds the fuel-management spreadsheet
/// template in the bound sheet.
pub const DEFAULT_FUNCTION: &str = "createFuelManagementTemplate";

/// Everything one invocation needs, resolved up front.
#[derive(Debug)]
pub struct Config {
    /// Apps Script project to execute
    pub script_id: String,
    /// Remote function name
    pub function: String,
    /// Ordered positional parameters for the remote function
    pub parameters: Vec<Value>,
    /// Google OAuth client secret file (externally provisioned)
    pub client_secret_path: PathBuf,
    /// Persisted credential file (written by this tool)
    pub credential_path: PathBuf,
}

impl Config {
    /// Resolve configuration from positional args (program name excluded)
    /// and the environment.
    ///
    /// Env vars: `SCRIPT_ID` (script id fallback), `GAS_CLIENT_SECRET`
    /// (default `creds.json`), `GAS_TOKEN_FILE` (default `token.json`),
    /// `GAS_FUNCTION` (default `createFuelManagementTemplate`).
    pub fn resolve(args: &[String]) -> common::Result<Self> {
        let script_id = args
            .first()
            .cloned()
            .or_else(|| std::env::var("SCRIPT_ID").ok())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                common::Error::Config(
                    "missing script id: pass it as the first argument or set SCRIPT_ID".into(),
                )
            })?;

        Ok(Self {
            script_id,
            function: env_or("GAS_FUNCTION", DEFAULT_FUNCTION),
            parameters: Vec::new(),
            client_secret_path: PathBuf::from(env_or("GAS_CLIENT_SECRET", "creds.json")),
            credential_path: PathBuf::from(env_or("GAS_TOKEN_FILE", "token.json")),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize tests that mutate environment variables, preventing
    /// data races when tests run in parallel.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn clear_env() {
        unsafe {
            remove_env("SCRIPT_ID");
            remove_env("GAS_FUNCTION");
            remove_env("GAS_CLIENT_SECRET");
            remove_env("GAS_TOKEN_FILE");
        }
    }

    #[test]
    fn script_id_from_positional_arg() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();

        let config = Config::resolve(&["abc123".into()]).unwrap();
        assert_eq!(config.script_id, "abc123");
        assert_eq!(config.function, DEFAULT_FUNCTION);
        assert!(config.parameters.is_empty());
        assert_eq!(config.client_secret_path, PathBuf::from("creds.json"));
        assert_eq!(config.credential_path, PathBuf::from("token.json"));
    }

    #[test]
    fn script_id_from_env_when_no_arg() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe { set_env("SCRIPT_ID", "env-script") };

        let config = Config::resolve(&[]).unwrap();
        assert_eq!(config.script_id, "env-script");

        unsafe { remove_env("SCRIPT_ID") };
    }

    #[test]
    fn arg_overrides_env_script_id() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe { set_env("SCRIPT_ID", "env-script") };

        let config = Config::resolve(&["arg-script".into()]).unwrap();
        assert_eq!(config.script_id, "arg-script");

        unsafe { remove_env("SCRIPT_ID") };
    }

    #[test]
    fn missing_script_id_is_config_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();

        let result = Config::resolve(&[]);
        match result {
            Err(common::Error::Config(msg)) => assert!(msg.contains("SCRIPT_ID")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn paths_and_function_come_from_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            set_env("GAS_FUNCTION", "otherFunction");
            set_env("GAS_CLIENT_SECRET", "/etc/gas/creds.json");
            set_env("GAS_TOKEN_FILE", "/var/lib/gas/token.json");
        }

        let config = Config::resolve(&["abc".into()]).unwrap();
        assert_eq!(config.function, "otherFunction");
        assert_eq!(
            config.client_secret_path,
            PathBuf::from("/etc/gas/creds.json")
        );
        assert_eq!(
            config.credential_path,
            PathBuf::from("/var/lib/gas/token.json")
        );

        clear_env();
    }

    #[test]
    fn empty_env_values_fall_back_to_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();
        unsafe {
            set_env("SCRIPT_ID", "");
            set_env("GAS_FUNCTION", "");
        }

        let result = Config::resolve(&[]);
        assert!(result.is_err(), "empty SCRIPT_ID must not count");

        let config = Config::resolve(&["abc".into()]).unwrap();
        assert_eq!(config.function, DEFAULT_FUNCTION);

        clear_env();
    }
}
