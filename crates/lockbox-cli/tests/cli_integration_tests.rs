//! CLI integration tests for lockbox
//!
//! Runs the lockbox binary end-to-end against temporary databases using
//! assert_cmd.

use assert_cmd::Command;
use lockbox_core::domain::auth::hash_password;
use lockbox_core::storage::Database;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Command isolated from the user's configuration
#[allow(deprecated)]
fn lockbox_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("lockbox").unwrap();
    cmd.env("LOCKBOX_CONFIG_DIR", home.path().join("config"));
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Create a database with two users and three accounts
fn seeded_db(home: &TempDir) -> PathBuf {
    let path = home.path().join("lockbox.db");
    let digest = hash_password("s4lt", "correct horse");

    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        let db = Database::open(Some(&path)).await.unwrap();
        sqlx::raw_sql(
            r#"
            INSERT INTO user_groups (id, name) VALUES (1, 'admins'), (2, 'ops'), (3, 'dev');
            INSERT INTO users (id, login, group_id, is_admin_app) VALUES (1, 'admin', 1, 1);
            INSERT INTO users (id, login, group_id) VALUES (3, 'bob', 3);
            INSERT INTO customers (id, name) VALUES (1, 'Acme'), (2, 'Globex');
            INSERT INTO accounts (id, name, login, customer_id, user_id, user_group_id, count_view)
            VALUES
                (1, 'Mail server', 'postmaster', 1, 1, 2, 10),
                (2, 'Billing DB', 'billing', 2, 3, 3, 3),
                (3, 'Intranet', 'www', 1, 1, 1, 0);
            INSERT INTO tags (id, name) VALUES (1, 'production');
            INSERT INTO account_tags (account_id, tag_id) VALUES (2, 1);
            INSERT INTO auth_tokens (user_id, action_id, token) VALUES (1, 7, 'abc123');
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO users (id, login, group_id, pass_hash, hash_salt) VALUES (2, 'alice', 2, ?, 's4lt')",
        )
        .bind(&digest)
        .execute(db.pool())
        .await
        .unwrap();

        db.close().await;
    });

    path
}

fn db_arg(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn test_init_creates_database() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("nested").join("lockbox.db");

    lockbox_cmd(&home)
        .args(["init", "--db", &db_arg(&path)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Schema version: 3"));

    assert!(path.exists());
}

#[test]
fn test_search_respects_visibility() {
    let home = TempDir::new().unwrap();
    let db = seeded_db(&home);

    lockbox_cmd(&home)
        .args(["search", "--db", &db_arg(&db), "--user", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mail server"))
        .stdout(predicate::str::contains("Billing DB").not())
        .stdout(predicate::str::contains("of 1 accounts"));
}

#[test]
fn test_admin_sees_everything_paginated() {
    let home = TempDir::new().unwrap();
    let db = seeded_db(&home);

    lockbox_cmd(&home)
        .args(["search", "--db", &db_arg(&db), "--user", "admin", "--count", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Showing 1-2 of 3 accounts"));
}

#[test]
fn test_tag_search_json() {
    let home = TempDir::new().unwrap();
    let db = seeded_db(&home);

    let output = lockbox_cmd(&home)
        .args([
            "search",
            "--db",
            &db_arg(&db),
            "--user",
            "admin",
            "--text",
            "tag:production",
            "--format",
            "json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "found");
    assert_eq!(json["total"], 1);
    assert_eq!(json["rows"][0]["account"]["name"], "Billing DB");
    assert_eq!(json["rows"][0]["tags"][0], "production");
}

#[test]
fn test_unknown_user_fails() {
    let home = TempDir::new().unwrap();
    let db = seeded_db(&home);

    lockbox_cmd(&home)
        .args(["search", "--db", &db_arg(&db), "--user", "mallory"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("mallory"));
}

#[test]
fn test_repeat_last_search_from_session() {
    let home = TempDir::new().unwrap();
    let db = seeded_db(&home);
    let session = home.path().join("session.json");

    lockbox_cmd(&home)
        .args(["search", "--db", &db_arg(&db), "--user", "admin", "--text", "intranet"])
        .args(["--session", &db_arg(&session)])
        .assert()
        .success();
    assert!(session.exists());

    lockbox_cmd(&home)
        .args(["search", "--db", &db_arg(&db), "--user", "admin", "--repeat"])
        .args(["--session", &db_arg(&session)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Intranet"))
        .stdout(predicate::str::contains("of 1 accounts"));
}

#[test]
fn test_auth_token_check() {
    let home = TempDir::new().unwrap();
    let db = seeded_db(&home);

    lockbox_cmd(&home)
        .args(["auth", "--db", &db_arg(&db), "token", "--action", "7", "abc123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));

    lockbox_cmd(&home)
        .args(["auth", "--db", &db_arg(&db), "token", "--action", "8", "abc123"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("invalid"));
}

#[test]
fn test_auth_login_reads_password_from_stdin() {
    let home = TempDir::new().unwrap();
    let db = seeded_db(&home);

    lockbox_cmd(&home)
        .args(["auth", "--db", &db_arg(&db), "login", "alice"])
        .write_stdin("correct horse\n")
        .assert()
        .success();

    lockbox_cmd(&home)
        .args(["auth", "--db", &db_arg(&db), "login", "alice"])
        .write_stdin("wrong\n")
        .assert()
        .failure();
}

#[test]
fn test_config_set_get_reset() {
    let home = TempDir::new().unwrap();

    lockbox_cmd(&home)
        .args(["config", "set", "search.account_count", "25"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set search.account_count = 25"));

    lockbox_cmd(&home)
        .args(["config", "get", "search.account_count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("25"));

    lockbox_cmd(&home)
        .args(["config", "set", "search.account_count", "many"])
        .assert()
        .failure();

    lockbox_cmd(&home).args(["config", "reset", "-q"]).assert().success();

    lockbox_cmd(&home)
        .args(["config", "get", "search.account_count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("12"));
}

#[test]
fn test_doctor_reports_database() {
    let home = TempDir::new().unwrap();
    let db = seeded_db(&home);

    lockbox_cmd(&home)
        .args(["doctor", "--db", &db_arg(&db)])
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] Database"));
}
