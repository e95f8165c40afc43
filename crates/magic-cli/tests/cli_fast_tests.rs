//! Fast CLI tests using assert_cmd.
//! These run the binaries directly; nothing here talks to a registry.

#![allow(deprecated)] // assert_cmd::Command::cargo_bin is deprecated but works fine

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const ANONYMOUS: &str = "{\"Username\":\"\",\"Secret\":\"\"}\n";

/// A runtime config root with one mapping: `foo` serves `example.com`
fn magic_root() -> TempDir {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join("etc")).unwrap();
    std::fs::write(
        tmp.path().join("etc/foo.yml"),
        "helper: foo\ndomains:\n  - example.com\n",
    )
    .unwrap();
    std::fs::create_dir_all(tmp.path().join("home")).unwrap();
    tmp
}

/// `docker-credential-magic` isolated from the caller's environment
fn magic(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("docker-credential-magic").unwrap();
    cmd.env("DOCKER_CREDENTIAL_MAGIC_CONFIG", root)
        .env("HOME", root.join("home"))
        .env_remove("DOCKER_ORIG_CONFIG")
        .env_remove("DOCKER_CONFIG")
        .env_remove("MAGIC_LOG");
    cmd
}

fn magician() -> Command {
    Command::cargo_bin("docker-credential-magician").unwrap()
}

#[test]
fn test_magic_version() {
    Command::cargo_bin("docker-credential-magic")
        .unwrap()
        .arg("version")
        .assert()
        .success()
        .stdout(format!("{}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_magic_requires_subcommand() {
    Command::cargo_bin("docker-credential-magic")
        .unwrap()
        .assert()
        .failure();
}

#[test]
fn test_get_without_match_or_fallback_is_anonymous() {
    let root = magic_root();
    magic(root.path())
        .arg("get")
        .write_stdin("registry.other.com\n")
        .assert()
        .success()
        .stdout(ANONYMOUS);
}

#[test]
fn test_get_invalid_domain() {
    let root = magic_root();
    magic(root.path())
        .arg("get")
        .write_stdin("localhost\n")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("[magic]").and(predicate::str::contains("invalid")));
}

#[test]
fn test_get_missing_mappings_dir_hints_init() {
    let tmp = TempDir::new().unwrap();
    magic(tmp.path())
        .arg("get")
        .write_stdin("sub.example.com\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("docker-credential-magic init"));
}

#[test]
fn test_get_falls_back_to_original_config() {
    let root = magic_root();
    let orig = root.path().join("orig");
    std::fs::create_dir_all(&orig).unwrap();
    std::fs::write(
        orig.join("config.json"),
        r#"{"auths": {"other.com": {"identitytoken": "refresh-token"}}}"#,
    )
    .unwrap();

    magic(root.path())
        .env("DOCKER_ORIG_CONFIG", &orig)
        .arg("get")
        .write_stdin("registry.other.com\n")
        .assert()
        .success()
        .stdout("{\"Username\":\"<token>\",\"Secret\":\"refresh-token\"}\n");
}

#[test]
fn test_get_falls_back_to_home_docker_config() {
    let root = magic_root();
    let docker_dir = root.path().join("home/.docker");
    std::fs::create_dir_all(&docker_dir).unwrap();
    std::fs::write(
        docker_dir.join("config.json"),
        r#"{"auths": {"https://other.com": {"username": "me", "password": "secret"}}}"#,
    )
    .unwrap();

    magic(root.path())
        .arg("get")
        .write_stdin("registry.other.com\n")
        .assert()
        .success()
        .stdout("{\"Username\":\"me\",\"Secret\":\"secret\"}\n");
}

#[cfg(unix)]
mod delegate {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Put an executable `docker-credential-foo` into `<root>/bin`
    fn install_helper(root: &Path, script: &str) -> String {
        let bin = root.join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let helper = bin.join("docker-credential-foo");
        std::fs::write(&helper, script).unwrap();
        std::fs::set_permissions(&helper, std::fs::Permissions::from_mode(0o755)).unwrap();

        let path = std::env::var("PATH").unwrap_or_default();
        format!("{}:{}", bin.display(), path)
    }

    #[test]
    fn test_get_delegates_to_mapped_helper() {
        let root = magic_root();
        let path = install_helper(
            root.path(),
            "#!/bin/sh\n[ \"$1\" = get ] || exit 9\nread -r line\nprintf '{\"Username\":\"foo\",\"Secret\":\"%s\"}\\n' \"$line\"\n",
        );

        magic(root.path())
            .env("PATH", path)
            .arg("get")
            .write_stdin("sub.example.com\n")
            .assert()
            .success()
            .stdout("{\"Username\":\"foo\",\"Secret\":\"sub.example.com\"}\n");
    }

    #[test]
    fn test_get_adopts_helper_exit_code() {
        let root = magic_root();
        let path = install_helper(
            root.path(),
            "#!/bin/sh\necho 'credentials not found in native keychain'\nexit 3\n",
        );

        magic(root.path())
            .env("PATH", path)
            .arg("get")
            .write_stdin("https://registry.example.com/v2/\n")
            .assert()
            .code(3)
            .stdout(predicate::str::contains("credentials not found"));
    }
}

#[test]
fn test_get_helper_not_installed() {
    let root = magic_root();
    magic(root.path())
        .env("PATH", root.path().join("empty-bin"))
        .arg("get")
        .write_stdin("sub.example.com\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("docker-credential-foo"));
}

#[test]
fn test_env_prints_config_root() {
    let root = magic_root();
    magic(root.path())
        .arg("env")
        .assert()
        .success()
        .stdout(format!(
            "DOCKER_CREDENTIAL_MAGIC_CONFIG=\"{}\"\n",
            root.path().display()
        ));
}

#[test]
fn test_init_installs_default_mappings_once() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("magic");

    magic(&root)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Creating directory"));
    for name in ["aws.yml", "azure.yml", "gcp.yml"] {
        assert!(root.join("etc").join(name).is_file(), "{} missing", name);
    }

    magic(&root)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists. Skipping."))
        .stdout(predicate::str::contains("Created mapping file").not());
}

#[test]
fn test_magician_help() {
    magician()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("docker-credential-magic"));
}

#[test]
fn test_magician_mutate_help() {
    magician()
        .args(["mutate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--include"))
        .stdout(predicate::str::contains("--mappings-dir"))
        .stdout(predicate::str::contains("--dispatcher"));
}

#[test]
fn test_magician_version() {
    magician()
        .arg("version")
        .assert()
        .success()
        .stdout(format!("{}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_magician_mutate_requires_source() {
    magician().arg("mutate").assert().failure();
}

#[test]
fn test_magician_unsupported_helper_fails_before_pull() {
    let tmp = TempDir::new().unwrap();
    magician()
        .args(["--config"])
        .arg(tmp.path().join("magician.toml"))
        .args(["mutate", "registry.invalid/app", "-i", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Helper 'nope' is not supported"))
        .stderr(predicate::str::contains("Pulling").not());
}

#[test]
fn test_magician_config_shows_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("magician.toml");
    std::fs::write(&path, "[registry]\ninsecure = [\"registry.internal:5000\"]\n").unwrap();

    magician()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("registry.internal:5000"));
}

#[test]
fn test_magician_invalid_config_fails() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("magician.toml");
    std::fs::write(&path, "[mutate\n").unwrap();

    magician()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse TOML"));
}
