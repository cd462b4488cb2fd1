use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process;
use tempfile::TempDir;

fn git(repo_path: &Path, args: &[&str]) {
    let output = process::Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()
        .unwrap();
    assert!(output.status.success(), "git {:?} failed", args);
}

fn commit_as(repo_path: &Path, author: &str) {
    git(repo_path, &["add", "."]);
    git(
        repo_path,
        &[
            "-c",
            &format!("user.name={}", author),
            "-c",
            &format!("user.email={}@example.com", author.to_lowercase()),
            "-c",
            "commit.gpgsign=false",
            "commit",
            "-q",
            "-m",
            &format!("work by {}", author),
        ],
    );
}

/// A repository where Alice wrote everything and Bob later edited line 6 of
/// `src/block.c`
fn create_test_repo() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    git(root, &["init", "-q"]);

    fs::create_dir_all(root.join("src")).unwrap();
    fs::create_dir_all(root.join("sub/.hidden")).unwrap();
    fs::write(
        root.join("src/single.rs"),
        "fn main() {\n    let x = 1;\n// TODO fix this\n}\n",
    )
    .unwrap();
    fs::write(
        root.join("src/block.c"),
        "int a;\nint b;\nint c;\nint d;\n/* started\nstill going\nclosing now */\n",
    )
    .unwrap();
    fs::write(root.join("sub/.hidden/file.txt"), "# TODO hidden\n").unwrap();
    fs::write(root.join("plain.txt"), "todo list outside any comment\n").unwrap();
    commit_as(root, "Alice");

    fs::write(
        root.join("src/block.c"),
        "int a;\nint b;\nint c;\nint d;\n/* started\nstill going, todo: revisit\nclosing now */\n",
    )
    .unwrap();
    commit_as(root, "Bob");

    temp_dir
}

#[test]
fn test_reports_attributed_todos() {
    let repo = create_test_repo();

    Command::cargo_bin("blametodo")
        .unwrap()
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(
            "src/block.c:6 (Bob) still going, todo: revisit \n\
             src/single.rs:3 (Alice) // TODO fix this \n",
        );
}

#[test]
fn test_scan_is_repeatable() {
    let repo = create_test_repo();

    let run = || {
        Command::cargo_bin("blametodo")
            .unwrap()
            .arg(".")
            .current_dir(repo.path())
            .output()
            .unwrap()
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn test_subdirectory_argument() {
    let repo = create_test_repo();

    Command::cargo_bin("blametodo")
        .unwrap()
        .arg("src")
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("src/single.rs:3 (Alice) // TODO fix this \n"))
        .stdout(predicate::str::contains("hidden").not());
}

#[test]
fn test_libgit2_backend_matches_cli() {
    let repo = create_test_repo();
    let config = repo.path().join("blametodo.toml");
    fs::write(&config, "blame_backend = \"libgit2\"\n").unwrap();
    let config_arg = config.to_str().unwrap();

    // The config file itself is untracked but has no TODO, so it is never blamed
    Command::cargo_bin("blametodo")
        .unwrap()
        .args(["--config", config_arg])
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(
            "src/block.c:6 (Bob) still going, todo: revisit \n\
             src/single.rs:3 (Alice) // TODO fix this \n",
        );
}

#[test]
fn test_json_output() {
    let repo = create_test_repo();

    let output = Command::cargo_bin("blametodo")
        .unwrap()
        .args(["--format", "json"])
        .current_dir(repo.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["total_count"], 2);
    assert_eq!(parsed["by_author"]["Bob"], 1);
    assert_eq!(parsed["findings"][1]["author"], "Alice");
}

#[test]
fn test_untracked_todo_aborts_without_partial_report() {
    let repo = create_test_repo();
    fs::write(repo.path().join("src/new.rs"), "// TODO not committed\n").unwrap();

    Command::cargo_bin("blametodo")
        .unwrap()
        .current_dir(repo.path())
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains("src/new.rs:1"));
}

#[test]
fn test_skip_unattributed_keeps_going() {
    let repo = create_test_repo();
    fs::write(repo.path().join("src/new.rs"), "// TODO not committed\n").unwrap();
    let config = repo.path().join("skip.toml");
    fs::write(&config, "skip_unattributed = true\n").unwrap();

    Command::cargo_bin("blametodo")
        .unwrap()
        .args(["-c", config.to_str().unwrap()])
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("src/single.rs:3 (Alice)"))
        .stdout(predicate::str::contains("new.rs").not());
}

#[test]
fn test_empty_tree() {
    let temp_dir = TempDir::new().unwrap();

    Command::cargo_bin("blametodo")
        .unwrap()
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout("");
}
