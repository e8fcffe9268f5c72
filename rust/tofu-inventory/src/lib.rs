//! Ansible dynamic inventory backed by OpenTofu outputs.
//!
//! The crate never exits the process itself. [`run`] returns an [`Outcome`] or an
//! [`InventoryError`]; the binary decides what to print where and which exit code to use.

pub mod cli;
pub mod error;
pub mod inventory;
pub mod state;


pub use cli::{protocol_args, Cli, Mode, USAGE};
pub use error::{InventoryError, InventoryResult};
pub use inventory::{build_inventory, InventoryDocument};
pub use state::{fetch_outputs, StateLocation, StateReader, TofuCli};

/// What a successful dispatch produced.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Outcome {
    /// JSON for stdout; exit 0.
    Emit(String),
    /// No recognised flag; usage goes to stderr, exit 1.
    Usage,
}

/// Render the `--list` document.
pub fn list<R: StateReader + ?Sized>(
    reader: &R,
    location: &StateLocation,
) -> InventoryResult<String> {
    let outputs = fetch_outputs(reader, location)?;
    let inventory = build_inventory(&outputs)?;
    Ok(serde_json::to_string_pretty(&inventory)?)
}

/// Dispatch a parsed command line. `location` is only resolved for `--list`, so `--host`
/// succeeds regardless of whether any state exists.
pub fn run<R, L>(cli: &Cli, reader: &R, location: L) -> InventoryResult<Outcome>
where
    R: StateReader + ?Sized,
    L: FnOnce() -> std::io::Result<StateLocation>,
{
    match cli.mode() {
        Mode::List => {
            let location = location().map_err(InventoryError::ProgramLocation)?;
            Ok(Outcome::Emit(list(reader, &location)?))
        }
        // Hostvars are already served through `_meta` in --list.
        Mode::Host => Ok(Outcome::Emit("{}".to_string())),
        Mode::Usage => Ok(Outcome::Usage),
    }
}
