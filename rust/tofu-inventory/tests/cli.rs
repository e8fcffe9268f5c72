//! End-to-end runs of the built binary. Each test lays out a throwaway repository:
//!
//! ```text
//! <tmp>/ansible/inventory/tofu-inventory   copy of the binary under test
//! <tmp>/tofu/environments/homelab/         tofu environment (state file optional)
//! <tmp>/bin/tofu                           fake tofu, the only thing on PATH
//! ```
#![cfg(unix)]

use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const OUTPUTS: &str =
    r#"{"control_plane_ip":{"sensitive":false,"type":"string","value":"10.0.0.5"},"worker_ip":{"sensitive":false,"type":"string","value":"10.0.0.6"}}"#;

const EXPECTED_LIST: &str = r#"{
  "control_plane": {
    "hosts": [
      "k3s-cp-01"
    ]
  },
  "workers": {
    "hosts": [
      "k3s-worker-01"
    ]
  },
  "_meta": {
    "hostvars": {
      "k3s-cp-01": {
        "ansible_host": "10.0.0.5"
      },
      "k3s-worker-01": {
        "ansible_host": "10.0.0.6"
      }
    }
  }
}
"#;

struct TestRepo {
    tmp: TempDir,
    program: PathBuf,
}

impl TestRepo {
    fn new() -> Self {
        let tmp = TempDir::new().expect("create temp repo");
        let inventory_dir = tmp.path().join("ansible/inventory");
        fs::create_dir_all(&inventory_dir).unwrap();
        fs::create_dir_all(tmp.path().join("tofu/environments/homelab")).unwrap();
        fs::create_dir_all(tmp.path().join("bin")).unwrap();

        let program = inventory_dir.join("tofu-inventory");
        fs::copy(assert_cmd::cargo::cargo_bin("tofu-inventory"), &program)
            .expect("copy binary under test");

        Self { tmp, program }
    }

    fn state_file(&self) -> PathBuf {
        self.tmp
            .path()
            .join("tofu/environments/homelab/terraform.tfstate")
    }

    fn with_state(self) -> Self {
        fs::write(self.state_file(), "{}").unwrap();
        self
    }

    fn with_tofu(self, body: &str) -> Self {
        let path = self.tmp.path().join("bin/tofu");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        self
    }

    fn with_outputs(self, json: &str) -> Self {
        self.with_tofu(&format!("printf '%s' '{}'", json))
    }

    fn path_dir(&self) -> &Path {
        self.tmp.path()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(self.path_dir())
            .env("PATH", self.path_dir().join("bin"))
            .env_remove("RUST_LOG");
        cmd
    }
}

#[test]
fn list_emits_inventory() {
    let repo = TestRepo::new().with_state().with_outputs(OUTPUTS);

    repo.cmd()
        .arg("--list")
        .assert()
        .success()
        .stdout(EXPECTED_LIST)
        .stderr("");
}

#[test]
fn list_is_byte_identical_across_runs() {
    let repo = TestRepo::new().with_state().with_outputs(OUTPUTS);

    let first = repo.cmd().arg("--list").output().unwrap();
    let second = repo.cmd().arg("--list").output().unwrap();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn list_without_state_file() {
    let repo = TestRepo::new().with_outputs(OUTPUTS);

    repo.cmd()
        .arg("--list")
        .assert()
        .code(1)
        .stdout("")
        .stderr(contains("tofu state not found at"))
        .stderr(contains("terraform.tfstate"))
        .stderr(contains("make tofu-apply"));
}

#[test]
fn list_without_tofu_on_path() {
    let repo = TestRepo::new().with_state();

    repo.cmd()
        .arg("--list")
        .assert()
        .code(1)
        .stdout("")
        .stderr(contains("'tofu' binary not found"));
}

#[test]
fn list_when_tofu_fails() {
    let repo = TestRepo::new()
        .with_state()
        .with_tofu("echo 'Error: Backend initialization required' >&2\nexit 1");

    repo.cmd()
        .arg("--list")
        .assert()
        .code(1)
        .stdout("")
        .stderr(contains("'tofu output' failed"))
        .stderr(contains("Backend initialization required"));
}

#[test]
fn list_with_missing_worker_output() {
    let repo = TestRepo::new()
        .with_state()
        .with_outputs(r#"{"control_plane_ip":{"value":"10.0.0.5"}}"#);

    repo.cmd()
        .arg("--list")
        .assert()
        .code(1)
        .stdout("")
        .stderr(contains("'worker_ip'"))
        .stderr(contains("outputs.tf"));
}

#[test]
fn host_is_always_empty() {
    // No state and no tofu: --host must not care.
    let repo = TestRepo::new();

    repo.cmd()
        .args(["--host", "anything"])
        .assert()
        .success()
        .stdout("{}\n")
        .stderr("");
}

#[test]
fn no_flag_prints_usage() {
    let repo = TestRepo::new();

    repo.cmd()
        .assert()
        .code(1)
        .stdout("")
        .stderr(contains("Usage: tofu-inventory --list | --host <hostname>"));
}

#[test]
fn unknown_flag_alone_prints_usage_once() {
    let repo = TestRepo::new();

    repo.cmd()
        .arg("--refresh")
        .assert()
        .code(1)
        .stdout("")
        .stderr("Usage: tofu-inventory --list | --host <hostname>\n");
}

#[test]
fn list_ignores_extra_args() {
    let repo = TestRepo::new().with_state().with_outputs(OUTPUTS);

    repo.cmd()
        .args(["--list", "--refresh"])
        .assert()
        .success()
        .stdout(EXPECTED_LIST)
        .stderr("");
}

#[test]
fn host_ignores_extra_args() {
    let repo = TestRepo::new();

    repo.cmd()
        .args(["--host", "a", "b"])
        .assert()
        .success()
        .stdout("{}\n");

    repo.cmd()
        .args(["--host", "-x"])
        .assert()
        .success()
        .stdout("{}\n");
}

#[test]
fn symlinked_program_uses_link_location() {
    // The real binary lives in a different tree with no state next to it.
    let elsewhere = TempDir::new().unwrap();
    let build_dir = elsewhere.path().join("x/y");
    fs::create_dir_all(&build_dir).unwrap();
    let real = build_dir.join("tofu-inventory");
    fs::copy(assert_cmd::cargo::cargo_bin("tofu-inventory"), &real).unwrap();

    let repo = TestRepo::new().with_state().with_outputs(OUTPUTS);
    let link = repo.path_dir().join("ansible/inventory/tofu-link");
    std::os::unix::fs::symlink(&real, &link).unwrap();

    Command::new(&link)
        .current_dir(repo.path_dir())
        .env("PATH", repo.path_dir().join("bin"))
        .env_remove("RUST_LOG")
        .arg("--list")
        .assert()
        .success()
        .stdout(EXPECTED_LIST);
}
