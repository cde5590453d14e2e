//! Fake external tools for driving the binary end to end.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

const FAKE_TOOL: &str = r#"#!/bin/sh
line="$(basename "$0") $*"
echo "$line" >> "$KSUP_TEST_LOG"
if [ -n "${FAKE_FAIL_MATCH:-}" ]; then
  case "$line" in
    *"$FAKE_FAIL_MATCH"*)
      echo "simulated failure: $line" >&2
      exit 1
      ;;
  esac
fi
echo "ok: $line"
"#;

/// A scratch directory holding fake `docker`, `kind` and `kubectl` scripts
/// that log every invocation.
#[derive(Debug)]
pub struct FakeTools {
    dir: TempDir,
}

impl FakeTools {
    /// Creates the scratch directory and installs the scripts.
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
        for tool in ["docker", "kind", "kubectl"] {
            let path = dir.path().join(tool);
            fs::write(&path, FAKE_TOOL).unwrap_or_else(|err| panic!("write {tool}: {err}"));
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
                .unwrap_or_else(|err| panic!("chmod {tool}: {err}"));
        }
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn tool(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }

    /// Path of the rendered kind configuration.
    pub fn config_path(&self) -> PathBuf {
        self.path().join("cluster").join("config.yaml")
    }

    /// A `ksup` command wired to the fake tools.
    pub fn command(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("ksup");
        cmd.current_dir(self.path())
            .env("KSUP_TEST_LOG", self.path().join("calls.log"))
            .env("KSUP_DOCKER_BIN", self.tool("docker"))
            .env("KSUP_KIND_BIN", self.tool("kind"))
            .env("KSUP_KUBECTL_BIN", self.tool("kubectl"))
            .env("KSUP_KIND_CONFIG_PATH", self.config_path())
            .env("RUST_LOG", "warn")
            .env_remove("KSUP_CONFIG_PATH")
            .env_remove("KSUP_NODE_IMAGE_REPOSITORY")
            .env_remove("KSUP_ABORT_ON_SYNC_FAILURE")
            .env_remove("FAKE_FAIL_MATCH");
        cmd
    }

    /// Every logged invocation, in the order the tools started.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    /// Index of the first logged call equal to `call`.
    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls().iter().position(|logged| logged == call)
    }
}
