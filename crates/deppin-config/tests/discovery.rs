//! Layered option loading against real files and environment variables.

use deppin_config::{ConfigDiscovery, LockfileFormat, Strategy};
use serde_json::{Map, Value};
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

struct EnvGuard(&'static [&'static str]);

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in self.0 {
            unsafe { std::env::remove_var(key) };
        }
    }
}

#[test]
#[serial]
fn environment_overrides_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("deppin.toml"),
        r#"
strategy = "import-trace"
allow-nested-vendor = false
"#,
    )
    .unwrap();

    let _guard = EnvGuard(&["DEPPIN_ALLOW_NESTED_VENDOR", "DEPPIN_STRATEGY"]);
    unsafe {
        std::env::set_var("DEPPIN_ALLOW_NESTED_VENDOR", "true");
        std::env::set_var("DEPPIN_STRATEGY", "manifest:glide");
    }

    let options = ConfigDiscovery::new(dir.path()).load().unwrap();
    assert!(options.allow_nested_vendor);
    assert_eq!(
        options.strategy,
        Strategy::Manifest(Some(LockfileFormat::Glide))
    );
}

#[test]
#[serial]
fn unrelated_prefixed_variables_are_ignored() {
    let dir = TempDir::new().unwrap();
    let _guard = EnvGuard(&["DEPPIN_GO_CMD", "DEPPIN_ALLOW_UNRESOLVED_PREFIX"]);
    unsafe {
        std::env::set_var("DEPPIN_GO_CMD", "/opt/go/bin/go");
        std::env::set_var("DEPPIN_ALLOW_UNRESOLVED_PREFIX", "internal.corp/ vendor.corp/");
    }

    let options = ConfigDiscovery::new(dir.path()).load().unwrap();
    assert_eq!(
        options.allow_unresolved_prefix,
        vec!["internal.corp/", "vendor.corp/"]
    );
}

#[test]
#[serial]
fn cli_overrides_beat_environment() {
    let dir = TempDir::new().unwrap();
    let _guard = EnvGuard(&["DEPPIN_SKIP_TRACING"]);
    unsafe { std::env::set_var("DEPPIN_SKIP_TRACING", "false") };

    let mut overrides = Map::new();
    overrides.insert("skip-tracing".to_string(), Value::Bool(true));

    let options = ConfigDiscovery::new(dir.path())
        .load_with(overrides)
        .unwrap();
    assert!(options.skip_tracing);
}

#[test]
fn invalid_file_values_are_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("deppin.toml"), "strategy = \"guess\"\n").unwrap();

    let err = ConfigDiscovery::new(dir.path())
        .without_env()
        .load()
        .unwrap_err();
    assert!(err.to_string().contains("guess"));
}

#[test]
fn unknown_file_keys_are_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("deppin.toml"), "allow-everything = true\n").unwrap();

    assert!(
        ConfigDiscovery::new(dir.path())
            .without_env()
            .load()
            .is_err()
    );
}
