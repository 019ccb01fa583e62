//! CLI integration tests
//!
//! Exercises the binary end to end for the offline commands. The chat
//! command needs live credentials, so it is not covered here.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Temp config whose prompt store holds one simple template
fn fixture() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("prompts");
    fs::create_dir_all(store.join("demo")).unwrap();
    fs::write(
        store.join("demo/greeting.yaml"),
        "greeting:\n  template: \"Hello {name}!\"\n  name: stranger\n",
    )
    .unwrap();

    let config_path = dir.path().join("config.yml");
    fs::write(
        &config_path,
        format!("prompts:\n  dir: {}\n", store.display()),
    )
    .unwrap();

    (dir, config_path)
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("axc")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("prompt"))
        .stdout(predicate::str::contains("agents"));
}

#[test]
fn prompt_list_shows_template_names() {
    let (_dir, config_path) = fixture();

    Command::cargo_bin("axc")
        .unwrap()
        .args(["-c", config_path.to_str().unwrap(), "prompt", "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("demo/greeting"));
}

#[test]
fn prompt_renders_with_vars() {
    let (_dir, config_path) = fixture();

    Command::cargo_bin("axc")
        .unwrap()
        .args([
            "-c",
            config_path.to_str().unwrap(),
            "prompt",
            "greeting",
            "--vars",
            "name=World",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello World!"));
}

#[test]
fn prompt_renders_defaults_without_vars() {
    let (_dir, config_path) = fixture();

    Command::cargo_bin("axc")
        .unwrap()
        .args(["-c", config_path.to_str().unwrap(), "prompt", "demo/greeting"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello stranger!"));
}

#[test]
fn prompt_debug_shows_resolved_record() {
    let (_dir, config_path) = fixture();

    Command::cargo_bin("axc")
        .unwrap()
        .args(["-c", config_path.to_str().unwrap(), "prompt", "greeting", "--debug"])
        .assert()
        .success()
        .stdout(predicate::str::contains("template:"))
        .stdout(predicate::str::contains("name: stranger"));
}

#[test]
fn prompt_without_name_prints_help() {
    let (_dir, config_path) = fixture();

    Command::cargo_bin("axc")
        .unwrap()
        .args(["-c", config_path.to_str().unwrap(), "prompt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn agents_lists_registered_agents() {
    let (_dir, config_path) = fixture();

    Command::cargo_bin("axc")
        .unwrap()
        .args(["-c", config_path.to_str().unwrap(), "agents"])
        .assert()
        .success()
        .stdout(predicate::str::contains("triage_agent"))
        .stdout(predicate::str::contains("arxiv_search_agent"));
}
