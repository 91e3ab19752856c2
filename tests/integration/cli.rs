//! End-to-end tests of the `coffer` binary against a directory-backed store

use assert_cmd::{cargo::cargo_bin_cmd, Command};
use coffer::config::schema::{StoreBackend, StoreConfig};
use coffer::config::Config;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temp config, cache root and bucket for one test
struct Sandbox {
    temp: TempDir,
    config: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let config = Config {
            cache: coffer::config::schema::CacheConfig {
                root: Some(temp.path().join("cache")),
            },
            store: StoreConfig {
                backend: StoreBackend::Local,
                path: Some(temp.path().join("bucket")),
                ..StoreConfig::default()
            },
        };
        let config_path = temp.path().join("config.toml");
        fs::write(&config_path, toml::to_string_pretty(&config).unwrap()).unwrap();

        Self {
            temp,
            config: config_path,
        }
    }

    fn coffer(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("coffer");
        cmd.env_remove("COFFER_CACHE_ROOT")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(&self.config);
        cmd
    }

    fn cache_root(&self) -> PathBuf {
        self.temp.path().join("cache")
    }

    fn write(&self, rel: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp.path().join("src").join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    /// Run `fetch` and return the printed path
    fn fetch(&self, args: &[&str]) -> PathBuf {
        let output = self.coffer().arg("fetch").args(args).assert().success();
        let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
        PathBuf::from(stdout.trim())
    }
}

fn publish(sandbox: &Sandbox, path: &Path, coordinate: &str) {
    sandbox
        .coffer()
        .arg("publish")
        .arg(path)
        .arg(coordinate)
        .assert()
        .success();
}

#[test]
fn help_displays() {
    cargo_bin_cmd!("coffer")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("versioned artifact cache"));
}

#[test]
fn version_displays() {
    cargo_bin_cmd!("coffer")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("coffer"));
}

#[test]
fn config_path_follows_flag() {
    let sandbox = Sandbox::new();
    sandbox
        .coffer()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_show() {
    let sandbox = Sandbox::new();
    sandbox
        .coffer()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[store]"))
        .stdout(predicate::str::contains("backend = \"local\""));
}

#[test]
fn config_set_persists() {
    let sandbox = Sandbox::new();
    sandbox
        .coffer()
        .args(["config", "set", "store.timeout_secs", "42"])
        .assert()
        .success();

    let saved = fs::read_to_string(&sandbox.config).unwrap();
    assert!(saved.contains("timeout_secs = 42"));
}

#[test]
fn config_set_refuses_unusable_value() {
    let sandbox = Sandbox::new();
    let before = fs::read_to_string(&sandbox.config).unwrap();

    sandbox
        .coffer()
        .args(["config", "set", "store.url", "dav.example.com/artifacts"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("store.url"));

    assert_eq!(fs::read_to_string(&sandbox.config).unwrap(), before);
}

#[test]
fn publish_then_fetch_file() {
    let sandbox = Sandbox::new();
    let src = sandbox.write("tool.bin", b"tool bytes");
    publish(&sandbox, &src, "com.example:tool:1");

    let path = sandbox.fetch(&["com.example:tool:1"]);
    assert!(path.starts_with(sandbox.cache_root()));
    assert_eq!(fs::read(&path).unwrap(), b"tool bytes");

    // Warm fetch prints the same path
    assert_eq!(sandbox.fetch(&["com.example:tool:1"]), path);
}

#[test]
fn publish_then_fetch_directory() {
    let sandbox = Sandbox::new();
    sandbox.write("tree/a.txt", b"a");
    sandbox.write("tree/nested/b.txt", b"b");
    let tree = sandbox.temp.path().join("src/tree");
    publish(&sandbox, &tree, "g:tree:3");

    let path = sandbox.fetch(&["--dir", "g:tree:3"]);
    assert!(path.is_dir());
    assert_eq!(fs::read(path.join("nested/b.txt")).unwrap(), b"b");
}

#[test]
fn fetch_missing_fails_with_does_not_exist() {
    let sandbox = Sandbox::new();
    sandbox
        .coffer()
        .args(["fetch", "g:missing:1"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn invalid_coordinate_is_rejected() {
    let sandbox = Sandbox::new();
    sandbox
        .coffer()
        .args(["fetch", "g:n:0"])
        .assert()
        .failure();
}

#[test]
fn publish_missing_path_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .coffer()
        .args(["publish", "/definitely/not/here", "g:n:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Path not found"));
}

#[test]
fn list_formats() {
    let sandbox = Sandbox::new();
    sandbox
        .coffer()
        .args(["list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));

    let src = sandbox.write("f", b"x");
    publish(&sandbox, &src, "g:n:1");
    let path = sandbox.fetch(&["g:n:1"]);

    sandbox
        .coffer()
        .args(["list", "--format", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains(path.display().to_string()));

    let output = sandbox
        .coffer()
        .args(["list", "--format", "json"])
        .assert()
        .success();
    let listed: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(listed[0]["coordinate"]["group"], "g");
    assert_eq!(listed[0]["coordinate"]["kind"], "file");
}

#[test]
fn evict_then_fetch_sees_republish() {
    let sandbox = Sandbox::new();
    let src = sandbox.write("f", b"v1");
    publish(&sandbox, &src, "g:n:1");
    let path = sandbox.fetch(&["g:n:1"]);

    fs::write(&src, b"v2").unwrap();
    publish(&sandbox, &src, "g:n:1");
    assert_eq!(fs::read(&path).unwrap(), b"v1");

    sandbox.coffer().args(["evict", "g:n:1"]).assert().success();
    let path = sandbox.fetch(&["g:n:1"]);
    assert_eq!(fs::read(&path).unwrap(), b"v2");
}

#[test]
fn unpublish_requires_confirmation() {
    let sandbox = Sandbox::new();
    let src = sandbox.write("f", b"x");
    publish(&sandbox, &src, "g:n:1");

    // Non-interactive without --yes keeps the artifact
    sandbox.coffer().args(["unpublish", "g:n:1"]).assert().success();
    sandbox.fetch(&["g:n:1"]);
    sandbox.coffer().args(["evict", "g:n:1"]).assert().success();

    sandbox
        .coffer()
        .args(["unpublish", "g:n:1", "--yes"])
        .assert()
        .success();
    sandbox
        .coffer()
        .args(["fetch", "g:n:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn wipe_removes_cache_root() {
    let sandbox = Sandbox::new();
    let src = sandbox.write("f", b"x");
    publish(&sandbox, &src, "g:n:1");
    sandbox.fetch(&["g:n:1"]);
    assert!(sandbox.cache_root().exists());

    sandbox.coffer().args(["wipe", "--yes"]).assert().success();
    assert!(!sandbox.cache_root().exists());

    // Next fetch downloads again
    let path = sandbox.fetch(&["g:n:1"]);
    assert_eq!(fs::read(path).unwrap(), b"x");
}

#[test]
fn cache_root_flag_overrides_config() {
    let sandbox = Sandbox::new();
    let src = sandbox.write("f", b"x");
    publish(&sandbox, &src, "g:n:1");

    let other = sandbox.temp.path().join("other-cache");
    let output = sandbox
        .coffer()
        .arg("--cache-root")
        .arg(&other)
        .args(["fetch", "g:n:1"])
        .assert()
        .success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    assert!(PathBuf::from(stdout.trim()).starts_with(&other));
}
