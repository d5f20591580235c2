use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary with an isolated, empty configuration directory
fn anidb_udp(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("anidb-udp").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("ANIDB_UDP_ACCOUNT__USERNAME")
        .env_remove("ANIDB_UDP_ACCOUNT__PASSWORD");
    cmd
}

#[test]
fn test_version() {
    let home = TempDir::new().unwrap();
    anidb_udp(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    anidb_udp(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ping"))
        .stdout(predicate::str::contains("anime-desc"))
        .stdout(predicate::str::contains("mylist-stats"));
}

#[cfg(not(target_os = "windows"))]
#[test]
fn test_config_path_follows_xdg() {
    let home = TempDir::new().unwrap();
    anidb_udp(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("anidb-udp"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_defaults() {
    let home = TempDir::new().unwrap();
    anidb_udp(&home)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api.anidb.net"))
        .stdout(predicate::str::contains("utf-16"));
}

#[test]
fn test_config_env_override() {
    let home = TempDir::new().unwrap();
    anidb_udp(&home)
        .env("ANIDB_UDP_SERVER__PORT", "9100")
        .args(["config", "get", "server.port"])
        .assert()
        .success()
        .stdout("9100\n");
}

#[test]
fn test_config_show_hides_password() {
    let home = TempDir::new().unwrap();
    anidb_udp(&home)
        .env("ANIDB_UDP_ACCOUNT__USERNAME", "bob")
        .env("ANIDB_UDP_ACCOUNT__PASSWORD", "hunter2")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bob"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[cfg(not(target_os = "windows"))]
#[test]
fn test_config_set_then_get() {
    let home = TempDir::new().unwrap();
    anidb_udp(&home)
        .args(["config", "set", "client.name", "myclient"])
        .assert()
        .success();
    anidb_udp(&home)
        .args(["config", "get", "client.name"])
        .assert()
        .success()
        .stdout("myclient\n");
}

#[test]
fn test_file_needs_lookup() {
    let home = TempDir::new().unwrap();
    anidb_udp(&home)
        .args(["file", "--size", "100"])
        .assert()
        .failure();
}

#[test]
fn test_commands_need_account() {
    let home = TempDir::new().unwrap();
    anidb_udp(&home)
        .args(["group", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No AniDB account configured"));
}

#[test]
fn test_invalid_vote_value() {
    let home = TempDir::new().unwrap();
    anidb_udp(&home)
        .args(["vote", "anime", "5", "50"])
        .assert()
        .failure();
}
