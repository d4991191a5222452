//! Built-in commands.
//!
//! Each command implements the
//! [`ManagementCommand`](crate::command::ManagementCommand) trait.

pub mod bind;
pub mod check;

pub use bind::{BindCommand, BindOptions};
pub use check::{CheckCommand, CheckReport, FormSummary};

use crate::command::CommandRegistry;

/// Registers all built-in commands into the given registry.
pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(CheckCommand));
    registry.register(Box::new(BindCommand));
}
