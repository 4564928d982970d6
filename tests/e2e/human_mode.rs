//! Human-mode end-to-end tests.

use crate::common::assertions::{assert_contains_all, assert_no_ansi};
use crate::common::cli::CliRunner;
use crate::common::fixtures::TestDb;
use crate::common::init_test_logging;

#[test]
fn human_version_is_not_json() {
    init_test_logging();
    let result = CliRunner::new().run(&["version"]);
    result.assert_success();

    let stdout = result.stdout.trim();
    assert!(
        serde_json::from_str::<serde_json::Value>(stdout).is_err(),
        "Human mode output should not be JSON"
    );
    assert_contains_all(stdout, &["pss ", "git:", "target:"]);
}

#[test]
fn quick_start_lists_commands() {
    init_test_logging();
    let result = CliRunner::new().with_env("NO_COLOR", "true").run(&[]);
    result.assert_success();
    assert_no_ansi(&result.stdout);
    assert_contains_all(&result.stdout, &["pss init", "pss status", "pss show"]);
}

#[test]
fn status_lists_photo_sources() {
    init_test_logging();
    let db = TestDb::empty();
    let cli = CliRunner::new().with_db(&db);
    cli.run(&["init"]).assert_success();

    let result = cli.run(&["status"]);
    result.assert_success();
    assert_no_ansi(&result.stdout);
    assert_contains_all(
        &result.stdout,
        &["SCREENSAVER", "PHOTO SOURCES", "usePopular500px", "useChromecast", "300s"],
    );
}

#[test]
fn error_shows_hint() {
    init_test_logging();
    let result = CliRunner::new().run(&["fetch", "best-of"]);
    result
        .assert_failure()
        .assert_stderr_contains("Unknown gallery")
        .assert_stderr_contains("Hint");
}
