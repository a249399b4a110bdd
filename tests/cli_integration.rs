//! Integration tests for the CredVault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.  The
//! master password comes from `CREDVAULT_PASSWORD` and entry passwords
//! are piped through stdin, so no terminal is needed.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const MASTER: &str = "Secret123";

/// Helper: get a Command pointing at the credvault binary.
fn credvault() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("credvault").expect("binary should exist");
    cmd.env_remove("CREDVAULT_DATA_DIR")
        .env_remove("CREDVAULT_PASSWORD");
    cmd
}

/// A data directory configured for the cheap KDF level.
fn data_dir() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tmp.child("data").create_dir_all().unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(
            tmp.child("data").path(),
            std::fs::Permissions::from_mode(0o700),
        )
        .unwrap();
    }
    tmp.child("data/config.toml")
        .write_str("kdf_level = \"LIGHT\"\n")
        .unwrap();
    tmp
}

fn in_vault(tmp: &TempDir, master: &str) -> Command {
    let mut cmd = credvault();
    cmd.arg("--data-dir")
        .arg(tmp.path().join("data"))
        .env("CREDVAULT_PASSWORD", master);
    cmd
}

fn init(tmp: &TempDir) {
    in_vault(tmp, MASTER)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Vault initialized"));
}

/// Add an entry and return its id as printed by the command.
fn add(tmp: &TempDir, service: &str, username: &str, password: &str) -> String {
    let out = in_vault(tmp, MASTER)
        .args(["add", "--service", service, "--username", username])
        .write_stdin(password)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let out = String::from_utf8(out).unwrap();
    out.lines()
        .find_map(|l| l.split("Entry id: ").nth(1))
        .map(|id| id.trim().to_string())
        .expect("entry id in output")
}

#[test]
fn help_flag_shows_usage() {
    credvault()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Encrypted local credential vault"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("purge"));
}

#[test]
fn version_flag_shows_version() {
    credvault()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("credvault"));
}

#[test]
fn no_args_shows_help() {
    credvault()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn unlock_without_vault_fails() {
    let tmp = data_dir();
    in_vault(&tmp, MASTER)
        .arg("unlock")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn missing_vault_is_reported_before_any_password_prompt() {
    let tmp = data_dir();
    // No CREDVAULT_PASSWORD and no terminal: a prompt would fail differently.
    credvault()
        .arg("--data-dir")
        .arg(tmp.path().join("data"))
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[cfg(unix)]
#[test]
fn world_readable_data_dir_is_refused_and_left_alone() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = data_dir();
    init(&tmp);
    add(&tmp, "github.com", "alice", "p@ss");
    let dir = tmp.path().join("data");
    std::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).unwrap();

    in_vault(&tmp, MASTER)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to access vault"))
        .stdout(predicate::str::contains("alice").not());

    let mode = std::fs::metadata(&dir).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[test]
fn non_utf8_entry_password_is_invalid_input() {
    let tmp = data_dir();
    init(&tmp);

    in_vault(&tmp, MASTER)
        .args(["add", "--service", "github.com", "--username", "alice"])
        .write_stdin(vec![0xffu8, 0xfe, b'\n'])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid password"));

    in_vault(&tmp, MASTER)
        .arg("audit")
        .assert()
        .success()
        .stdout(predicate::str::contains("input.invalid"));
}

#[test]
fn shown_password_has_escape_sequences_stripped() {
    let tmp = data_dir();
    init(&tmp);
    add(&tmp, "github.com", "alice", "pw\x1b[2Jx");

    in_vault(&tmp, MASTER)
        .args(["get", "--service", "github.com", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Password: pwx"))
        .stdout(predicate::str::contains("\x1b[2J").not())
        .stderr(predicate::str::contains("control characters"));
}

#[test]
fn init_rejects_short_master_password() {
    let tmp = data_dir();
    in_vault(&tmp, "short")
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8 characters"));
}

#[test]
fn add_list_get_flow() {
    let tmp = data_dir();
    init(&tmp);
    let id = add(&tmp, "github.com", "alice", "p@ss");

    in_vault(&tmp, MASTER)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("github.com"))
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("p@ss").not());

    in_vault(&tmp, MASTER)
        .args(["get", "--id", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Username: alice"))
        .stdout(predicate::str::contains("[hidden]"))
        .stdout(predicate::str::contains("p@ss").not());

    in_vault(&tmp, MASTER)
        .args(["get", "--service", "github.com", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Password: p@ss"));
}

#[test]
fn wrong_master_password_is_refused() {
    let tmp = data_dir();
    init(&tmp);

    in_vault(&tmp, "WrongPassword")
        .arg("unlock")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid credentials"));
}

#[test]
fn invalid_service_is_rejected_before_unlock() {
    let tmp = data_dir();
    init(&tmp);

    in_vault(&tmp, MASTER)
        .args(["add", "--service", "bad service!", "--username", "alice"])
        .write_stdin("p@ss")
        .assert()
        .failure();
}

#[test]
fn update_and_delete_flow() {
    let tmp = data_dir();
    init(&tmp);
    let id = add(&tmp, "github.com", "alice", "p@ss");

    in_vault(&tmp, MASTER)
        .args(["update", "--id", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to update"));

    in_vault(&tmp, MASTER)
        .args(["update", "--id", &id, "--username", "bob"])
        .assert()
        .success();

    in_vault(&tmp, MASTER)
        .args(["get", "--id", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Username: bob"));

    in_vault(&tmp, MASTER)
        .args(["delete", "--id", &id, "--force"])
        .assert()
        .success();

    in_vault(&tmp, MASTER)
        .args(["get", "--id", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn purge_removes_vault() {
    let tmp = data_dir();
    init(&tmp);

    in_vault(&tmp, MASTER)
        .args(["purge", "--force"])
        .assert()
        .success();

    tmp.child("data/vault.dat")
        .assert(predicate::path::missing());
}

#[test]
fn audit_lists_recorded_events() {
    let tmp = data_dir();
    init(&tmp);
    add(&tmp, "github.com", "alice", "p@ss");

    in_vault(&tmp, MASTER)
        .arg("audit")
        .assert()
        .success()
        .stdout(predicate::str::contains("vault.init"))
        .stdout(predicate::str::contains("entry.add"))
        .stdout(predicate::str::contains("vault.lock"))
        .stdout(predicate::str::contains("p@ss").not());
}

#[test]
fn completions_generate_script() {
    credvault()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("credvault"));
}
