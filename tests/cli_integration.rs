/// End-to-end tests for the `ibot` binary: argument parsing, configuration
/// loading and validation, and the offline carbon-data commands.
///
/// Network-backed commands are covered by the client integration tests;
/// everything here must pass without a backend.
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

mod common;

fn ibot() -> Command {
    Command::cargo_bin("ibot").expect("binary not built")
}

#[test]
fn test_help_lists_all_subcommands() {
    ibot()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("kb"))
        .stdout(predicate::str::contains("doc"))
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("carbon"));
}

#[test]
fn test_version_reports_package() {
    ibot()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ibot"));
}

#[test]
fn test_no_subcommand_shows_usage() {
    ibot()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_rejects_non_numeric_top_k() {
    ibot()
        .args(["ask", "什么是碳排放?", "--top-k", "many"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_kb_delete_requires_id() {
    ibot()
        .args(["kb", "delete"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_kb_delete_declined_at_prompt_aborts() {
    // Without --yes the command asks first; declining never touches the
    // backend, so this passes offline.
    ibot()
        .args(["kb", "delete", "7"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Aborted."));
}

#[test]
fn test_config_validation_failure_stops_startup() {
    let (_temp_dir, config_path) = common::temp_config_file("chat:\n  top_k: 500\n");

    ibot()
        .arg("--config")
        .arg(config_path)
        .args(["kb", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("top_k must be between 1 and 50"));
}

#[test]
fn test_malformed_config_is_reported() {
    let (_temp_dir, config_path) = common::temp_config_file("api: [unclosed\n");

    ibot()
        .arg("--config")
        .arg(config_path)
        .args(["kb", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_ask_requires_knowledge_base() {
    let (_temp_dir, config_path) =
        common::temp_config_file("api:\n  base_url: \"http://127.0.0.1:9/\"\n");

    ibot()
        .arg("--config")
        .arg(config_path)
        .args(["ask", "什么是碳排放?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no knowledge base selected"));
}

#[test]
fn test_base_url_env_override_must_parse() {
    ibot()
        .env("IBOT_BASE_URL", "not a url")
        .args(["kb", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid base URL"));
}

#[test]
fn test_base_url_flag_override_must_parse() {
    ibot()
        .args(["--base-url", "::not-a-url::", "kb", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid base URL"));
}

#[test]
fn test_carbon_generate_writes_importable_dataset() {
    let out_dir = TempDir::new().expect("failed to create tempdir");
    let dataset_path = out_dir.path().join("dataset.json");

    ibot()
        .args(["carbon", "generate"])
        .args(["--industry", "power"])
        .args(["--name", "测试电力公司"])
        .args(["--year", "2024"])
        .arg("--output")
        .arg(&dataset_path)
        .assert()
        .success();

    let raw = std::fs::read_to_string(&dataset_path).expect("dataset not written");
    let dataset: serde_json::Value = serde_json::from_str(&raw).expect("dataset is not JSON");

    assert_eq!(dataset["company"]["f_company_name"], "测试电力公司");
    assert_eq!(dataset["dailyData"].as_array().map(Vec::len), Some(366));
    assert_eq!(dataset["satelliteData"].as_array().map(Vec::len), Some(800));
    assert!(dataset["scope2"].is_object());
    assert!(dataset["scope3"].is_object());
}

#[test]
fn test_carbon_validate_accepts_generated_dataset() {
    let out_dir = TempDir::new().expect("failed to create tempdir");
    let dataset_path = out_dir.path().join("dataset.json");

    ibot()
        .args(["carbon", "generate"])
        .args(["--industry", "aviation"])
        .args(["--name", "测试航空公司"])
        .arg("--output")
        .arg(&dataset_path)
        .assert()
        .success();

    ibot()
        .args(["carbon", "validate"])
        .arg(&dataset_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dataset is valid."));
}

#[test]
fn test_carbon_validate_rejects_garbage_file() {
    let out_dir = TempDir::new().expect("failed to create tempdir");
    let bad_path = out_dir.path().join("bad.json");
    std::fs::write(&bad_path, "not a dataset").expect("failed to write file");

    ibot()
        .args(["carbon", "validate"])
        .arg(&bad_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a valid dataset"));
}

#[test]
fn test_carbon_generate_rejects_unknown_industry() {
    let out_dir = TempDir::new().expect("failed to create tempdir");
    let dataset_path = out_dir.path().join("dataset.json");

    ibot()
        .args(["carbon", "generate"])
        .args(["--industry", "spaceship"])
        .args(["--name", "X"])
        .arg("--output")
        .arg(&dataset_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown industry"));
}

#[test]
fn test_doc_upload_missing_file_fails() {
    let (_temp_dir, config_path) =
        common::temp_config_file("api:\n  base_url: \"http://127.0.0.1:9/\"\n");

    ibot()
        .arg("--config")
        .arg(config_path)
        .args(["doc", "upload", "--kb", "1", "/definitely/missing/file.pdf"])
        .assert()
        .failure();
}
