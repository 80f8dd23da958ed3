use serial_test::serial;
use std::fs::write;
use store_sync::load_config::{api_key_from_env, load_detect_config, load_sync_config};
use tempfile::NamedTempFile;

fn clear_env() {
    for var in [
        "DOCS_PATH",
        "LAST_SYNC_COMMIT",
        "CHANGED_DIRS",
        "GEMINI_API_KEY",
    ] {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn detect_config_defaults_without_file_or_env() {
    clear_env();
    let config = load_detect_config(None).expect("defaults should load");
    assert_eq!(config.docs.docs_path, std::path::PathBuf::from("docs"));
    assert_eq!(config.docs.max_depth, 2);
    assert!(config.last_sync_commit.is_none());
}

#[test]
#[serial]
fn yaml_file_overrides_defaults() {
    clear_env();
    let file = NamedTempFile::new().unwrap();
    write(
        file.path(),
        b"docs_path: documentation\nmax_depth: 3\nexclude_file: skip.txt\n",
    )
    .unwrap();

    let config = load_detect_config(Some(file.path())).expect("config should parse");
    assert_eq!(
        config.docs.docs_path,
        std::path::PathBuf::from("documentation")
    );
    assert_eq!(config.docs.max_depth, 3);
    assert_eq!(
        config.docs.exclude_file,
        std::path::PathBuf::from("skip.txt")
    );
}

#[test]
#[serial]
fn docs_path_env_wins_over_file() {
    clear_env();
    let file = NamedTempFile::new().unwrap();
    write(file.path(), b"docs_path: from-file\n").unwrap();
    std::env::set_var("DOCS_PATH", "from-env");

    let config = load_detect_config(Some(file.path())).expect("config should parse");
    assert_eq!(config.docs.docs_path, std::path::PathBuf::from("from-env"));
    clear_env();
}

#[test]
#[serial]
fn blank_last_sync_commit_means_full_discovery() {
    clear_env();
    std::env::set_var("LAST_SYNC_COMMIT", "   ");
    let config = load_detect_config(None).expect("config should load");
    assert!(config.last_sync_commit.is_none());
    clear_env();
}

#[test]
#[serial]
fn last_sync_commit_is_trimmed_and_kept() {
    clear_env();
    std::env::set_var("LAST_SYNC_COMMIT", " abc123 ");
    let config = load_detect_config(None).expect("config should load");
    assert_eq!(config.last_sync_commit.as_deref(), Some("abc123"));
    clear_env();
}

#[test]
#[serial]
fn missing_changed_dirs_defaults_to_empty() {
    clear_env();
    let config = load_sync_config(None).expect("config should load");
    assert!(config.changed_dirs.is_empty());
}

#[test]
#[serial]
fn changed_dirs_json_array_is_parsed() {
    clear_env();
    std::env::set_var("CHANGED_DIRS", r#"["context", "Factory-AI/factory"]"#);
    let config = load_sync_config(None).expect("config should load");
    assert_eq!(
        config.changed_dirs,
        vec!["context".to_string(), "Factory-AI/factory".to_string()]
    );
    clear_env();
}

#[test]
#[serial]
fn malformed_changed_dirs_is_a_fatal_config_error() {
    clear_env();
    std::env::set_var("CHANGED_DIRS", "not json at all");
    let err = load_sync_config(None).expect_err("should reject malformed input");
    assert!(err.to_string().contains("CHANGED_DIRS"));
    clear_env();
}

#[test]
#[serial]
fn changed_dirs_must_be_an_array() {
    clear_env();
    std::env::set_var("CHANGED_DIRS", r#"{"store": true}"#);
    assert!(load_sync_config(None).is_err());
    clear_env();
}

#[test]
#[serial]
fn missing_api_key_is_a_fatal_startup_error() {
    clear_env();
    let err = api_key_from_env().expect_err("missing key must fail");
    assert!(err.to_string().contains("GEMINI_API_KEY"));
}

#[test]
#[serial]
fn present_api_key_is_returned() {
    clear_env();
    std::env::set_var("GEMINI_API_KEY", "test-key");
    assert_eq!(api_key_from_env().unwrap(), "test-key");
    clear_env();
}
