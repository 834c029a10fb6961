use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("taskdeck")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("signup"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("tasks"));
}

#[test]
fn test_tasks_help_shows_subcommands() {
    cargo_bin_cmd!("taskdeck")
        .args(["tasks", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("toggle"))
        .stdout(predicate::str::contains("delete"));
}

#[test]
fn test_login_requires_email() {
    cargo_bin_cmd!("taskdeck")
        .env_remove("TASKDECK_EMAIL")
        .arg("login")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--email"));
}

#[test]
fn test_task_screen_requires_terminal() {
    let dir = tempfile::tempdir().unwrap();

    cargo_bin_cmd!("taskdeck")
        .env("TASKDECK_HOME", dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires a terminal"))
        .stderr(predicate::str::contains("taskdeck tasks list"));
}
