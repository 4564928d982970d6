//! Environment variable behavior end-to-end tests.

use crate::common::cli::CliRunner;
use crate::common::fixtures::TestDb;
use crate::common::init_test_logging;

#[test]
fn pss_format_env_sets_json_output() {
    init_test_logging();
    let cli = CliRunner::new().with_env("PSS_FORMAT", "json");
    let result = cli.run(&["version"]);
    result.assert_success();

    let json: serde_json::Value = serde_json::from_str(result.stdout.trim())
        .expect("Expected JSON output with PSS_FORMAT=json");
    assert!(json.get("version").is_some());
}

#[test]
fn pss_format_env_sets_compact_json() {
    init_test_logging();
    let cli = CliRunner::new().with_env("PSS_FORMAT", "json-compact");
    let result = cli.run(&["version"]);
    result.assert_success();

    let stdout = result.stdout.trim_end();
    let json: serde_json::Value = serde_json::from_str(stdout)
        .expect("Expected JSON output with PSS_FORMAT=json-compact");
    assert!(json.get("version").is_some());
    assert_eq!(stdout.lines().count(), 1, "Expected compact JSON single line");
}

#[test]
fn cli_format_flag_overrides_env() {
    init_test_logging();
    let cli = CliRunner::new().with_env("PSS_FORMAT", "json");
    let result = cli.run(&["version", "--format=text"]);
    result.assert_success();

    assert!(
        serde_json::from_str::<serde_json::Value>(result.stdout.trim()).is_err(),
        "--format=text should override PSS_FORMAT=json"
    );
}

#[test]
fn db_flag_overrides_env() {
    init_test_logging();
    let from_env = TestDb::empty();
    let from_flag = TestDb::empty();
    let cli = CliRunner::new().with_db(&from_env);

    cli.run(&["--db", from_flag.arg(), "init"]).assert_success();

    assert_eq!(from_flag.raw("version").as_deref(), Some("9"));
    assert!(!from_env.path().exists());
}

#[test]
fn unusable_db_path_exits_with_error() {
    init_test_logging();
    let blocker = TestDb::empty();
    std::fs::write(blocker.path(), "").expect("Failed to create blocking file");
    let nested = blocker.path().join("settings.db");

    CliRunner::new()
        .run(&["--db", nested.to_str().expect("temp path is not UTF-8"), "get"])
        .assert_exit_code(1)
        .assert_stderr_contains("Storage error");
}
