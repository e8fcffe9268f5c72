//! Locating the OpenTofu state for the homelab environment and reading its outputs. The only
//! side effect in the crate lives here: running `tofu output -json` against the environment
//! directory. Callers go through the [`StateReader`] trait so the inventory logic can be driven
//! by a canned reader instead of a real `tofu` install.

use crate::error::{InventoryError, InventoryResult};
use log::debug;
use serde_derive::Deserialize;
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

/// Environment directory, relative to the repository root.
pub const TOFU_ENV_SUBPATH: &str = "tofu/environments/homelab";
/// State file that must exist in the environment directory before `tofu` is asked anything.
pub const STATE_FILE_NAME: &str = "terraform.tfstate";
/// Query program, resolved via `PATH`.
pub const TOFU_PROGRAM: &str = "tofu";

/// A single entry of `tofu output -json`. Tofu also emits `type`, which is ignored.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct OutputValue {
    pub value: serde_json::Value,
    #[serde(default)]
    pub sensitive: bool,
}

/// Output name to output entry, as printed by `tofu output -json`.
pub type QueryOutput = BTreeMap<String, OutputValue>;

/// Where the state for the homelab environment is expected to live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLocation {
    dir: PathBuf,
}

impl StateLocation {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Derive the environment directory from a program installed at
    /// `<repo>/ansible/inventory/<program>`: two levels above the program's directory is the
    /// repository root.
    pub fn from_program_path(program: &Path) -> Self {
        let program_dir = program.parent().unwrap_or_else(|| Path::new("/"));
        let repo_root = normalize(&program_dir.join("..").join(".."));
        Self::new(repo_root.join(TOFU_ENV_SUBPATH))
    }

    /// Derive the location from `argv[0]` made absolute against `cwd`. Returns `None` for a bare
    /// program name, which was found via `PATH` and says nothing about the repository.
    pub fn from_argv0(argv0: &Path, cwd: &Path) -> Option<Self> {
        if argv0.components().count() < 2 {
            return None;
        }
        Some(Self::from_program_path(&cwd.join(argv0)))
    }

    /// Locate the state relative to the path this process was invoked by. Symlinks are not
    /// resolved, so a link under `ansible/inventory/` finds that repository's state. Falls back
    /// to the resolved executable when `argv[0]` carries no directory.
    pub fn from_invocation() -> io::Result<Self> {
        if let Some(argv0) = std::env::args_os().next() {
            let cwd = std::env::current_dir()?;
            if let Some(location) = Self::from_argv0(Path::new(&argv0), &cwd) {
                return Ok(location);
            }
        }
        Self::from_current_exe()
    }

    pub fn from_current_exe() -> io::Result<Self> {
        let exe = std::env::current_exe()?;
        Ok(Self::from_program_path(&exe))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state_file(&self) -> PathBuf {
        self.dir.join(STATE_FILE_NAME)
    }

    /// Fail fast if the state file has not been created yet.
    pub fn ensure_exists(&self) -> InventoryResult<()> {
        let state_file = self.state_file();
        if !state_file.exists() {
            return Err(InventoryError::StateNotFound { path: state_file });
        }
        Ok(())
    }
}

// Lexical `..` folding. The directories involved may not exist yet, so no `fs::canonicalize`.
fn normalize(path: &Path) -> PathBuf {
    let mut ret = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !ret.pop() {
                    ret.push(component);
                }
            }
            other => ret.push(other),
        }
    }
    ret
}

/// Capability to read the outputs of a tofu environment.
pub trait StateReader {
    fn read_outputs(&self, location: &StateLocation) -> InventoryResult<QueryOutput>;
}

/// Check that the state exists, then ask `reader` for the outputs of that environment.
pub fn fetch_outputs<R: StateReader + ?Sized>(
    reader: &R,
    location: &StateLocation,
) -> InventoryResult<QueryOutput> {
    debug!("Reading tofu state from {}", location.dir().display());
    location.ensure_exists()?;
    reader.read_outputs(location)
}

/// Reads outputs by running `tofu -chdir=<dir> output -json` to completion.
#[derive(Debug, Clone)]
pub struct TofuCli {
    program: PathBuf,
}

impl Default for TofuCli {
    fn default() -> Self {
        Self::new(TOFU_PROGRAM)
    }
}

impl TofuCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }
}

impl StateReader for TofuCli {
    fn read_outputs(&self, location: &StateLocation) -> InventoryResult<QueryOutput> {
        let chdir = format!("-chdir={}", location.dir().display());
        debug!("Running {} {} output -json", self.program_name(), chdir);

        let output = Command::new(&self.program)
            .arg(&chdir)
            .arg("output")
            .arg("-json")
            .output()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => InventoryError::ToolMissing {
                    program: self.program_name(),
                },
                _ => InventoryError::Spawn {
                    program: self.program_name(),
                    source: e,
                },
            })?;

        if !output.status.success() {
            debug!("{} exited with {}", self.program_name(), output.status);
            return Err(InventoryError::QueryFailed {
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let outputs: QueryOutput = serde_json::from_slice(&output.stdout)?;
        debug!("tofu returned {} outputs", outputs.len());
        Ok(outputs)
    }
}
