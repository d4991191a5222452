//! # formmap-cli
//!
//! Command-line tooling for formmap-rs definition files.
//!
//! - **`check`** - Loads definition files and reports their forms, failing on
//!   any configuration error.
//! - **`bind`** - Binds a query string and body to a form, validates it, and
//!   prints the messages and the generated object as JSON.
//!
//! ## Quick Start
//!
//! ```rust
//! use formmap_cli::command::CommandRegistry;
//! use formmap_cli::commands::register_builtin_commands;
//!
//! let mut registry = CommandRegistry::new();
//! register_builtin_commands(&mut registry);
//!
//! let names = registry.list_commands();
//! assert!(names.contains(&"check"));
//! assert!(names.contains(&"bind"));
//! ```

pub mod command;
pub mod commands;

pub use command::{CommandRegistry, ManagementCommand};
