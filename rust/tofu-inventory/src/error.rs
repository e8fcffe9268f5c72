use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop an inventory run. None of these are retried; the binary prints
/// the message to stderr and exits with [`InventoryError::exit_code`].
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("tofu state not found at {}\nRun 'make tofu-apply' first.", path.display())]
    StateNotFound { path: PathBuf },

    #[error("cannot locate the running program: {0}")]
    ProgramLocation(#[source] io::Error),

    #[error("'{program}' binary not found. Run 'mise install'.")]
    ToolMissing { program: String },

    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("'tofu output' failed:\n{stderr}")]
    QueryFailed { stderr: String },

    #[error("'tofu output' returned malformed JSON: {0}")]
    MalformedOutput(#[from] serde_json::Error),

    #[error(
        "expected tofu output '{key}' not found. Check tofu/environments/homelab/outputs.tf."
    )]
    MissingOutput { key: String },
}

pub type InventoryResult<T> = Result<T, InventoryError>;

impl InventoryError {
    /// Process exit code reported for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            InventoryError::StateNotFound { .. }
            | InventoryError::ProgramLocation(_)
            | InventoryError::ToolMissing { .. }
            | InventoryError::Spawn { .. }
            | InventoryError::QueryFailed { .. }
            | InventoryError::MalformedOutput(_)
            | InventoryError::MissingOutput { .. } => 1,
        }
    }

    pub fn missing_output(key: &str) -> Self {
        Self::MissingOutput {
            key: key.to_string(),
        }
    }
}
