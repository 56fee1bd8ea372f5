//! CLI smoke tests for yini_build.
//!
//! Only paths that never reach a real toolchain are exercised here.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn yini_build() -> Command {
    cargo_bin_cmd!("yini_build")
}

#[test]
fn help_lists_actions() {
    yini_build()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("coverage").and(predicate::str::contains("benchmark")));
}

#[test]
fn clean_removes_existing_build_dir() {
    let temp = TempDir::new().unwrap();
    let build = temp.path().join("build");
    std::fs::create_dir_all(build.join("src")).unwrap();
    std::fs::write(build.join("CMakeCache.txt"), "CMAKE_BUILD_TYPE:STRING=Release\n").unwrap();

    yini_build()
        .arg("clean")
        .arg("--project-root")
        .arg(temp.path())
        .assert()
        .success();

    assert!(!build.exists());
}

#[test]
fn clean_without_build_dir_succeeds() {
    let temp = TempDir::new().unwrap();

    yini_build()
        .args(["clean", "--project-root"])
        .arg(temp.path())
        .assert()
        .success();
}

#[test]
fn unknown_action_fails() {
    yini_build()
        .arg("deploy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn dry_run_prints_coverage_plan() {
    let temp = TempDir::new().unwrap();

    yini_build()
        .args(["coverage", "--config", "Release", "--dry-run", "--project-root"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"effective_mode\": \"Debug\"")
                .and(predicate::str::contains("\"reset\""))
                .and(predicate::str::contains("\"coverage_report\"")),
        );

    assert!(!temp.path().join("build").exists());
}

#[test]
fn missing_cmake_project_fails_with_exit_code_one() {
    let temp = TempDir::new().unwrap();

    yini_build()
        .args(["build", "--project-root"])
        .arg(temp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No CMake project found"));
}
