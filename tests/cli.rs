use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;

fn globe(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("globe").unwrap();
    cmd.arg("--data-dir").arg(data_dir);
    // keep stray env from pointing the CLI somewhere else
    cmd.env_remove("GLOBE_API_BASE")
        .env_remove("GLOBE_DATA_DIR")
        .env_remove("GLOBE_TIMEOUT_SECS");
    cmd
}

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("globe").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("globe"))
        .stdout(predicate::str::contains("favorites"));
}

#[test]
fn rejects_unknown_sort_order() {
    let dir = tempfile::tempdir().unwrap();
    globe(dir.path())
        .args(["list", "--sort", "sideways"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown sort order"));
}

#[test]
fn rejects_zero_timeout() {
    let dir = tempfile::tempdir().unwrap();
    globe(dir.path())
        .args(["--timeout", "0", "regions"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--timeout"));
}

#[test]
fn register_whoami_logout_round() {
    let dir = tempfile::tempdir().unwrap();
    globe(dir.path())
        .args([
            "register",
            "--name",
            "Ada",
            "--email",
            "ada@example.com",
            "--password",
            "secret1",
            "--confirm-password",
            "secret1",
        ])
        .assert()
        .success();

    globe(dir.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("ada@example.com"))
        .stdout(predicate::str::contains("0 countries saved"));

    globe(dir.path())
        .args(["favorites", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No favorites yet"));

    globe(dir.path()).arg("logout").assert().success();
    globe(dir.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}

#[test]
fn duplicate_registration_and_bad_login_fail() {
    let dir = tempfile::tempdir().unwrap();
    let register = |password: &str| {
        let mut cmd = globe(dir.path());
        cmd.args([
            "register",
            "--name",
            "Bo",
            "--email",
            "bo@example.com",
            "--password",
            password,
            "--confirm-password",
            password,
        ]);
        cmd
    };
    register("secret1").assert().success();
    register("secret2")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Email already in use"));

    globe(dir.path())
        .args(["login", "--email", "bo@example.com", "--password", "nope-nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid credentials"));

    globe(dir.path())
        .args(["login", "--email", "bo@example.com", "--password", "secret1"])
        .assert()
        .success();
}

#[test]
fn mismatched_confirmation_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    globe(dir.path())
        .args([
            "register",
            "--name",
            "Cy",
            "--email",
            "cy@example.com",
            "--password",
            "secret1",
            "--confirm-password",
            "secret9",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Passwords do not match"));
}

#[test]
fn favorites_need_login() {
    let dir = tempfile::tempdir().unwrap();
    globe(dir.path())
        .args(["favorites", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

// Live test (opt-in): cargo test --features online
#[cfg(feature = "online")]
#[test]
fn list_online_region() {
    let dir = tempfile::tempdir().unwrap();
    globe(dir.path())
        .args(["list", "--region", "Europe", "--sort", "populationDesc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("DEU"));
}
