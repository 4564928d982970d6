//! Runs the `pss` binary against a throwaway settings database.

use std::collections::BTreeMap;
use std::process::Command;

use serde_json::Value;

use super::fixtures::TestDb;

/// Runner for the compiled `pss` binary.
///
/// Logging is switched off unless a test sets `RUST_LOG` itself.
///
/// ```ignore
/// let db = TestDb::empty();
/// CliRunner::new()
///     .with_db(&db)
///     .run_json(&["init"])
///     .assert_success()
///     .assert_json_field("/version", &json!(9));
/// ```
pub struct CliRunner {
    env: BTreeMap<String, String>,
}

impl CliRunner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            env: BTreeMap::new(),
        }
        .with_env("RUST_LOG", "off")
    }

    /// Point `PSS_DB` at the given settings database.
    #[must_use]
    pub fn with_db(self, db: &TestDb) -> Self {
        self.with_env(pss::config::DB_ENV_VAR, db.arg())
    }

    #[must_use]
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// # Panics
    ///
    /// Panics if the binary cannot be started.
    #[must_use]
    pub fn run(&self, args: &[&str]) -> CliResult {
        let output = Command::new(env!("CARGO_BIN_EXE_pss"))
            .args(args)
            .envs(&self.env)
            .output()
            .expect("Failed to execute pss");

        CliResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
            args: args.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Run with `--json` prepended.
    #[must_use]
    pub fn run_json(&self, args: &[&str]) -> CliResult {
        let mut full = vec!["--json"];
        full.extend(args);
        self.run(&full)
    }
}

/// Captured output with chainable assertions.
#[derive(Debug, Clone)]
pub struct CliResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub args: Vec<String>,
}

impl CliResult {
    pub fn assert_success(&self) -> &Self {
        assert_eq!(
            self.exit_code, 0,
            "Command {:?} failed: {}",
            self.args, self.stderr
        );
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert_ne!(
            self.exit_code, 0,
            "Command {:?} unexpectedly succeeded",
            self.args
        );
        self
    }

    pub fn assert_exit_code(&self, expected: i32) -> &Self {
        assert_eq!(
            self.exit_code, expected,
            "Expected exit code {expected} for {:?}",
            self.args
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "stdout does not contain \"{text}\"\nActual stdout:\n{}",
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "stderr does not contain \"{text}\"\nActual stderr:\n{}",
            self.stderr
        );
        self
    }

    pub fn assert_stderr_is_empty(&self) -> &Self {
        assert!(
            self.stderr.trim().is_empty(),
            "Expected empty stderr, got: {}",
            self.stderr
        );
        self
    }

    /// # Panics
    ///
    /// Panics if stdout is not valid JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|_| panic!("Failed to parse JSON from stdout:\n{}", self.stdout))
    }

    /// Compare the value at a JSON pointer.
    pub fn assert_json_field(&self, pointer: &str, expected: &Value) -> &Self {
        let json = self.json();
        let actual = json
            .pointer(pointer)
            .unwrap_or_else(|| panic!("JSON path {pointer} not found in:\n{json:#}"));
        assert_eq!(actual, expected, "JSON field {pointer} mismatch");
        self
    }

    pub fn assert_json_array_len(&self, pointer: &str, expected: usize) -> &Self {
        let json = self.json();
        let len = json
            .pointer(pointer)
            .and_then(Value::as_array)
            .unwrap_or_else(|| panic!("JSON path {pointer} is not an array"))
            .len();
        assert_eq!(len, expected, "Array at {pointer} has {len} elements");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_runner_version() {
        CliRunner::new()
            .run(&["version"])
            .assert_success()
            .assert_stdout_contains("pss ")
            .assert_stderr_is_empty();
    }

    #[test]
    fn test_runner_json_mode() {
        CliRunner::new()
            .run_json(&[])
            .assert_success()
            .assert_json_field("/tool", &json!("pss"));
    }

    #[test]
    fn test_runner_invalid_command() {
        CliRunner::new()
            .run(&["nonexistent-command"])
            .assert_exit_code(2);
    }
}
