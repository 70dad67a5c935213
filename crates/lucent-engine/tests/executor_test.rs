mod common;

use common::{
    FakeDriver, FixedClassifier, RecordingSleeper, ScriptedJudge, loading_config, verifier,
};
use lucent_engine::DriverError;
use lucent_engine::cli::{FileOptions, OutputHandlers, run_file};
use lucent_engine::config::VerificationConfig;
use lucent_engine::executor::{CommandExecutor, ExecutorError, ParseError};
use std::io::Write;
use tempfile::NamedTempFile;

fn executor(judge: &ScriptedJudge) -> CommandExecutor<ScriptedJudge, FixedClassifier> {
    CommandExecutor::new(verifier(
        judge,
        &FixedClassifier::new(false),
        loading_config(2000, 1000),
        VerificationConfig::default(),
        &RecordingSleeper::default(),
    ))
}

fn quiet() -> OutputHandlers {
    OutputHandlers {
        out: |_| {},
        err: |_| {},
    }
}

fn script(lines: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(lines.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_actions_reach_the_driver() {
    let driver = FakeDriver::new();
    let judge = ScriptedJudge::always(true);
    let mut exec = executor(&judge);

    for line in [
        "goto https://example.test/calculator",
        "click 4",
        "hover 5",
        "type 7 \"1 + 1\"",
        "select 9 hi",
        "press enter",
    ] {
        let result = exec.execute_line(&driver, line).await.unwrap();
        assert!(result.success, "{}", line);
    }

    assert_eq!(
        driver.actions(),
        vec![
            "goto:https://example.test/calculator",
            "click:4",
            "hover:5",
            "type:7:1 + 1",
            "select:9:hi",
            "press:Enter",
        ]
    );
}

#[tokio::test]
async fn test_verify_reports_pass_and_fail() {
    let driver = FakeDriver::new();
    let judge = ScriptedJudge::sequence(&[true, false]);
    let mut exec = executor(&judge);

    let pass = exec
        .execute_line(&driver, "verify \"result is 2\"")
        .await
        .unwrap();
    assert!(pass.success);
    assert_eq!(pass.output, "PASS: attempt 1 on Calculator");

    let fail = exec
        .execute_line(&driver, "verify result is 3")
        .await
        .unwrap();
    assert!(!fail.success);
    assert_eq!(fail.output, "FAIL: attempt 2 on Calculator");
}

#[tokio::test]
async fn test_verify_vision_takes_screenshot() {
    let driver = FakeDriver::new();
    let judge = ScriptedJudge::always(true);
    let mut exec = executor(&judge);

    exec.execute_line(&driver, "verify-vision logo is red")
        .await
        .unwrap();

    assert_eq!(driver.screenshots(), 1);
    assert_eq!(judge.screenshots_seen(), vec![true]);
}

#[tokio::test]
async fn test_page_queries() {
    let driver = FakeDriver::new();
    let judge = ScriptedJudge::always(true);
    let mut exec = executor(&judge);

    let title = exec.execute_line(&driver, "title").await.unwrap();
    assert_eq!(title.output, "Calculator");

    let url = exec.execute_line(&driver, "url").await.unwrap();
    assert_eq!(url.output, "https://example.test/calculator");

    let tree = exec.execute_line(&driver, "tree").await.unwrap();
    assert!(tree.output.contains("textbox"));
    assert_eq!(driver.waits(), 1);
}

#[tokio::test]
async fn test_screenshot_is_written_to_disk() {
    let driver = FakeDriver::new();
    let judge = ScriptedJudge::always(true);
    let mut exec = executor(&judge);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shot.png");

    let result = exec
        .execute_line(&driver, &format!("screenshot {}", path.display()))
        .await
        .unwrap();

    assert!(result.output.contains("4 bytes"));
    assert_eq!(std::fs::read(&path).unwrap(), vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_unsupported_drag_surfaces_driver_error() {
    let driver = FakeDriver::new();
    let judge = ScriptedJudge::always(true);
    let mut exec = executor(&judge);

    let err = exec.execute_line(&driver, "drag 1 2").await.unwrap_err();
    assert!(matches!(
        err,
        ExecutorError::Driver(DriverError::NotSupported(_))
    ));
}

#[tokio::test]
async fn test_quoted_text_reaches_the_driver_unescaped() {
    let driver = FakeDriver::new();
    let judge = ScriptedJudge::always(true);
    let mut exec = executor(&judge);

    for line in [r#"type 5 "say \"hi\"""#, "type 6 'it''s'", "type 7 plain   words  "] {
        exec.execute_line(&driver, line).await.unwrap();
    }

    assert_eq!(
        driver.actions(),
        vec!["type:5:say \"hi\"", "type:6:'it''s'", "type:7:plain   words"]
    );
}

#[tokio::test]
async fn test_parse_errors_do_not_touch_the_driver() {
    let driver = FakeDriver::new();
    let judge = ScriptedJudge::always(true);
    let mut exec = executor(&judge);

    let err = exec.execute_line(&driver, "click abc").await.unwrap_err();
    assert!(matches!(
        err,
        ExecutorError::Parse(ParseError::InvalidNodeRef(_))
    ));
    assert!(driver.actions().is_empty());
    assert_eq!(judge.calls(), 0);
}

#[tokio::test]
async fn test_run_file_skips_comments_and_counts_failures() {
    let driver = FakeDriver::new();
    let judge = ScriptedJudge::sequence(&[false, true]);
    let mut exec = executor(&judge);
    let file = script("# calculator smoke test\n\ngoto https://example.test\nclick 3\nverify shows 2\nverify shows 2\n");

    let summary = run_file(
        &driver,
        &mut exec,
        quiet(),
        file.path().to_str().unwrap(),
        FileOptions {
            stop_on_error: false,
            fail_on_verification: true,
        },
    )
    .await
    .unwrap();

    assert_eq!(summary.executed, 4);
    assert_eq!(summary.failed, 1);
}

#[tokio::test]
async fn test_run_file_stops_on_first_error() {
    let driver = FakeDriver::new();
    let judge = ScriptedJudge::always(true);
    let mut exec = executor(&judge);
    let file = script("click 1\nfly away\nclick 2\n");

    let result = run_file(
        &driver,
        &mut exec,
        quiet(),
        file.path().to_str().unwrap(),
        FileOptions {
            stop_on_error: true,
            fail_on_verification: false,
        },
    )
    .await;

    assert!(result.is_err());
    assert_eq!(driver.actions(), vec!["click:1"]);
}

#[tokio::test]
async fn test_negative_verification_is_not_a_failure_by_default() {
    let driver = FakeDriver::new();
    let judge = ScriptedJudge::always(false);
    let mut exec = executor(&judge);
    let file = script("verify nothing is broken\n");

    let summary = run_file(
        &driver,
        &mut exec,
        quiet(),
        file.path().to_str().unwrap(),
        FileOptions {
            stop_on_error: true,
            fail_on_verification: false,
        },
    )
    .await
    .unwrap();

    assert_eq!(summary.failed, 0);
}
