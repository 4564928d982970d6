//! JSON-mode end-to-end tests.

use serde_json::{Value, json};

use crate::common::assertions::assert_json_has_fields;
use crate::common::cli::CliRunner;
use crate::common::fixtures::TestDb;
use crate::common::init_test_logging;

fn parse_json(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| panic!("Failed to parse JSON:\n{text}"))
}

#[test]
fn json_quick_start() {
    init_test_logging();
    let result = CliRunner::new().run(&["--json"]);
    result.assert_success();

    let json = assert_json_has_fields(result.stdout.trim(), &["tool", "settings", "runtime"]);
    assert_eq!(json["tool"], "pss");
}

#[test]
fn init_stamps_version() {
    init_test_logging();
    let db = TestDb::empty();
    CliRunner::new()
        .with_db(&db)
        .run_json(&["init"])
        .assert_success()
        .assert_json_field("/version", &json!(9))
        .assert_json_field("/restored", &json!(false));
}

#[test]
fn init_migrates_legacy_store() {
    init_test_logging();
    let db = TestDb::legacy_v7();
    CliRunner::new().with_db(&db).run(&["init"]).assert_success();

    let transition = parse_json(&db.raw("transitionTime").unwrap());
    assert_eq!(transition, json!({"base": 10, "display": 10, "unit": 0}));
    assert_eq!(db.raw("enabled").as_deref(), Some("false"));
    assert!(db.raw("useFlickr").is_none());
}

#[test]
fn restore_keeps_excluded_keys() {
    init_test_logging();
    let db = TestDb::with_entries(&[
        ("version", "9"),
        ("useGoogle", "false"),
        ("albumSelections", r#"[{"id":"x"}]"#),
        ("showTime", "2"),
    ]);
    CliRunner::new()
        .with_db(&db)
        .run(&["init", "--restore"])
        .assert_success();

    assert_eq!(db.raw("useGoogle").as_deref(), Some("false"));
    assert_eq!(db.raw("albumSelections").as_deref(), Some(r#"[{"id":"x"}]"#));
    assert_eq!(db.raw("showTime").as_deref(), Some("1"));
}

#[test]
fn set_then_get_round_trips() {
    init_test_logging();
    let db = TestDb::empty();
    let cli = CliRunner::new().with_db(&db);
    cli.run(&["init"]).assert_success();

    cli.run_json(&["set", "activeStart", "08:30"])
        .assert_success()
        .assert_json_field("/applied", &json!(true));
    cli.run_json(&["get", "activeStart"])
        .assert_success()
        .assert_json_field("/value", &json!("08:30"));
}

#[test]
fn toggle_flips_enabled() {
    init_test_logging();
    let db = TestDb::empty();
    let cli = CliRunner::new().with_db(&db);
    cli.run(&["init"]).assert_success();

    cli.run_json(&["toggle"])
        .assert_success()
        .assert_json_field("/enabled", &json!(false));
    cli.run_json(&["status"])
        .assert_success()
        .assert_json_field("/enabled", &json!(false))
        .assert_json_field("/badge", &json!("OFF"));
}

#[test]
fn show_opens_one_window_on_headless_host() {
    init_test_logging();
    let db = TestDb::empty();
    let cli = CliRunner::new().with_db(&db);
    cli.run(&["init"]).assert_success();

    let result = cli.run_json(&["show"]);
    result
        .assert_success()
        .assert_json_array_len("/placements", 1)
        .assert_json_field("/placements/0/result", &json!("opened"))
        .assert_json_field("/placements/0/phase", &json!("fullscreen"));
}

#[test]
fn unknown_gallery_error_is_json() {
    init_test_logging();
    let result = CliRunner::new().run_json(&["fetch", "nope"]);
    result.assert_failure();

    let json = parse_json(result.stderr.trim());
    assert_eq!(json["error"], true);
    assert_eq!(json["recoverable"], true);
    assert!(json["suggestion"].is_string());
}

#[test]
fn process_unknown_key_is_noop() {
    init_test_logging();
    let db = TestDb::empty();
    let cli = CliRunner::new().with_db(&db);
    cli.run(&["init"]).assert_success();
    cli.run_json(&["process", "notASetting"])
        .assert_success()
        .assert_json_field("/processed", &json!("notASetting"));
}
