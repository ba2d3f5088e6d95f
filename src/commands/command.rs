//! Command trait definition for CLI commands.
//!
//! Each command provides an `execute` method that runs the command's main
//! logic. The trait uses `enum_dispatch` for efficient dispatch across the
//! subcommand enum in `main`.

use anyhow::Result;
use enum_dispatch::enum_dispatch;

/// Trait implemented by all nonref CLI commands.
#[enum_dispatch]
pub trait Command {
    #[allow(clippy::missing_errors_doc)]
    fn execute(&self) -> Result<()>;
}
