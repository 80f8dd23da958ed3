use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn touch(path: &Path) {
    create_dir_all(path.parent().unwrap()).unwrap();
    let mut f = File::create(path).unwrap();
    writeln!(f, "content").unwrap();
}

fn store_sync() -> Command {
    let mut cmd = Command::cargo_bin("store-sync").expect("binary exists");
    for var in [
        "DOCS_PATH",
        "LAST_SYNC_COMMIT",
        "CHANGED_DIRS",
        "GEMINI_API_KEY",
        "GITHUB_OUTPUT",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn detect_prints_full_store_set_as_json_without_prior_commit() {
    let tmp = tempdir().unwrap();
    let docs = tmp.path().join("docs");
    touch(&docs.join("a/readme.md"));
    touch(&docs.join("b/c/notes.md"));

    store_sync()
        .arg("detect")
        .env("DOCS_PATH", &docs)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"["a","b/c"]"#));
}

#[test]
fn detect_on_missing_docs_root_emits_empty_array() {
    let tmp = tempdir().unwrap();

    store_sync()
        .arg("detect")
        .env("DOCS_PATH", tmp.path().join("never-checked-out"))
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn detect_writes_changed_dirs_to_the_output_sink() {
    let tmp = tempdir().unwrap();
    let docs = tmp.path().join("docs");
    touch(&docs.join("guides/intro.md"));
    let sink = tmp.path().join("github_output");

    store_sync()
        .arg("detect")
        .env("DOCS_PATH", &docs)
        .env("GITHUB_OUTPUT", &sink)
        .assert()
        .success();

    let written = std::fs::read_to_string(&sink).unwrap();
    assert!(written.contains("changed_dirs<<EOF"));
    assert!(written.contains(r#"["guides"]"#));
    assert!(written.contains("\nEOF"));
}

#[test]
fn detect_respects_exclusion_patterns() {
    let tmp = tempdir().unwrap();
    let docs = tmp.path().join("docs");
    touch(&docs.join("archived/old.md"));
    touch(&docs.join("current/new.md"));
    let mut f = File::create(docs.join(".sync-exclude")).unwrap();
    writeln!(f, "archived").unwrap();
    drop(f);

    store_sync()
        .arg("detect")
        .env("DOCS_PATH", &docs)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"["current"]"#));
}

#[test]
fn sync_rejects_malformed_changed_dirs() {
    let tmp = tempdir().unwrap();

    store_sync()
        .arg("sync")
        .env("DOCS_PATH", tmp.path())
        .env("CHANGED_DIRS", "not-a-json-array")
        .assert()
        .failure()
        .stderr(predicate::str::contains("CHANGED_DIRS"));
}

#[test]
fn sync_without_api_key_fails_at_startup() {
    let tmp = tempdir().unwrap();

    store_sync()
        .arg("sync")
        .env("DOCS_PATH", tmp.path())
        .env("CHANGED_DIRS", r#"["guides"]"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
}

#[test]
fn audit_without_api_key_fails_at_startup() {
    store_sync()
        .arg("audit")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
}
