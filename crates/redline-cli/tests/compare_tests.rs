//! End-to-end runs of the compare command in mock mode

use redline_cli::cli::CompareArgs;
use redline_cli::commands::execute_compare;
use redline_cli::{CliError, Formatter};
use serde_json::Value;
use tempfile::TempDir;

fn args(original: &str, amendment: &str) -> CompareArgs {
    CompareArgs {
        original: original.to_string(),
        amendment: amendment.to_string(),
        contract_id: None,
        output: None,
        compact: false,
    }
}

#[tokio::test]
async fn test_mock_compare_writes_envelope() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("result.json");

    let mut args = args("mock://original", "mock://amendment");
    args.contract_id = Some("cli-1".to_string());
    args.output = Some(output.clone());
    args.compact = true;

    execute_compare(args, None, true, &Formatter::new(false)).await.unwrap();

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(!written.contains('\n'));

    let envelope: Value = serde_json::from_str(&written).unwrap();
    assert_eq!(envelope["contract_id"], "cli-1");
    assert_eq!(envelope["status"], "success");
    assert_eq!(envelope["result"]["sections_changed"][0], "2. Terms");
    assert!(envelope["error"].is_null());
}

#[tokio::test]
async fn test_local_image_files_are_accepted() {
    let dir = TempDir::new().unwrap();
    let original = dir.path().join("original.png");
    let amendment = dir.path().join("amendment.png");
    std::fs::write(&original, b"png").unwrap();
    std::fs::write(&amendment, b"png").unwrap();

    let mut args = args(original.to_str().unwrap(), amendment.to_str().unwrap());
    args.output = Some(dir.path().join("out.json"));

    execute_compare(args, None, true, &Formatter::new(false)).await.unwrap();
}

#[tokio::test]
async fn test_missing_original_fails_before_the_pipeline() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.png");

    let err = execute_compare(
        args(missing.to_str().unwrap(), "mock://amendment"),
        None,
        true,
        &Formatter::new(false),
    )
    .await
    .unwrap_err();

    match err {
        CliError::FileNotFound { what, path } => {
            assert_eq!(what, "Original contract");
            assert!(path.ends_with("nope.png"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_bad_config_file_is_a_settings_error() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("redline.toml");
    std::fs::write(&config, "api_port = \"not a number\"").unwrap();

    let err = execute_compare(
        args("mock://original", "mock://amendment"),
        Some(config.as_path()),
        true,
        &Formatter::new(false),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CliError::Settings(_)));
}
