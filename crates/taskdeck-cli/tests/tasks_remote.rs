//! Account and task commands against a mock backend.

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ANON_KEY: &str = "anon-test-key";

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

fn taskdeck(home: &Path, server: &MockServer) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("taskdeck");
    cmd.env("TASKDECK_HOME", home)
        .env("TASKDECK_URL", server.uri())
        .env("TASKDECK_ANON_KEY", ANON_KEY)
        .env_remove("TASKDECK_EMAIL")
        .env_remove("TASKDECK_LOG");
    cmd
}

fn write_session(home: &Path) {
    let expires_at = unix_now() + 3600;
    let session = json!({
        "access_token": "at-a",
        "refresh_token": "rt-a",
        "expires_at": expires_at,
        "user": { "id": "u-a", "email": "a@x.com" }
    });
    std::fs::write(home.join("session.json"), session.to_string()).unwrap();
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
        .try_into()
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_persists_session_for_later_commands() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", ANON_KEY))
        .and(body_partial_json(json!({ "email": "a@x.com", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at-a",
            "refresh_token": "rt-a",
            "token_type": "bearer",
            "expires_in": 3600,
            "user": { "id": "u-a", "email": "a@x.com" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();

    taskdeck(home.path(), &server)
        .args(["login", "--email", "a@x.com"])
        .write_stdin("pw\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as a@x.com"));

    let session_file = home.path().join("session.json");
    assert!(session_file.exists());
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&session_file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer at-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u-a",
            "email": "a@x.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    taskdeck(home.path(), &server)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("a@x.com (u-a)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_whoami_reports_rejected_token() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "msg": "invalid JWT: unable to parse or verify signature"
        })))
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    write_session(home.path());

    taskdeck(home.path(), &server)
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to verify session: invalid JWT"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_with_wrong_password_fails() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let home = tempdir().unwrap();

    taskdeck(home.path(), &server)
        .args(["login", "--email", "a@x.com"])
        .write_stdin("nope\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid login credentials"));

    assert!(!home.path().join("session.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_password_is_rejected_before_network() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();

    taskdeck(home.path(), &server)
        .args(["login", "--email", "a@x.com"])
        .write_stdin("\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Password cannot be empty"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_signup_requiring_confirmation_prints_notice() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "u-new",
            "email": "new@x.com",
            "confirmation_sent_at": "2024-05-01T10:00:00Z"
        })))
        .mount(&server)
        .await;

    let home = tempdir().unwrap();

    taskdeck(home.path(), &server)
        .args(["signup", "--email", "new@x.com"])
        .write_stdin("secret\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Check new@x.com for a confirmation link",
        ));

    assert!(!home.path().join("session.json").exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tasks_require_a_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();

    taskdeck(home.path(), &server)
        .args(["tasks", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_add_toggle_delete() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/tasks"))
        .and(query_param("user_id", "eq.u-a"))
        .and(query_param("order", "created_at.desc"))
        .and(header("authorization", "Bearer at-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "t2",
                "title": "Walk dog",
                "completed": true,
                "created_at": "2024-05-02T10:00:00Z",
                "user_id": "u-a"
            },
            {
                "id": "t1",
                "title": "Buy milk",
                "completed": false,
                "created_at": "2024-05-01T10:00:00Z",
                "user_id": "u-a"
            }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/tasks"))
        .and(body_partial_json(json!([{ "title": "Call mom", "user_id": "u-a" }])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "t3",
            "title": "Call mom",
            "completed": false,
            "created_at": "2024-05-03T10:00:00Z",
            "user_id": "u-a"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/tasks"))
        .and(query_param("id", "eq.t1"))
        .and(body_partial_json(json!({ "completed": true })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/tasks"))
        .and(query_param("id", "eq.t2"))
        .and(query_param("user_id", "eq.u-a"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    write_session(home.path());

    let output = taskdeck(home.path(), &server)
        .args(["tasks", "list"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("[x] t2  Walk dog"));
    assert!(lines[1].starts_with("[ ] t1  Buy milk"));

    taskdeck(home.path(), &server)
        .args(["tasks", "add", "  Call mom  "])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added task t3: Call mom"));

    taskdeck(home.path(), &server)
        .args(["tasks", "toggle", "t1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked t1 as done"));

    taskdeck(home.path(), &server)
        .args(["tasks", "delete", "t2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted task t2"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_blank_title_is_rejected() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    write_session(home.path());

    taskdeck(home.path(), &server)
        .args(["tasks", "add", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Task title cannot be empty"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logout_removes_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer at-a"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    write_session(home.path());

    taskdeck(home.path(), &server)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out."));

    assert!(!home.path().join("session.json").exists());

    taskdeck(home.path(), &server)
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_logout_forgets_unrestorable_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let home = tempdir().unwrap();
    let expired = json!({
        "access_token": "at-a",
        "refresh_token": "rt-a",
        "expires_at": 0,
        "user": { "id": "u-a", "email": "a@x.com" }
    });
    let session_file = home.path().join("session.json");
    std::fs::write(&session_file, expired.to_string()).unwrap();

    taskdeck(home.path(), &server)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in."));

    assert!(!session_file.exists());
}
