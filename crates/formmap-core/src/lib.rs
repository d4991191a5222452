//! # formmap-core
//!
//! Core types, settings, and error types for the formmap-rs engine.
//! This crate has no engine dependencies and provides the foundation for all other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`messages`] - The message sink that collects validation failures
//! - [`utils`] - Utility types (`MultiValueDict`)
//! - [`settings`] - Engine settings
//! - [`settings_loader`] - Settings loading from TOML/JSON files and the environment
//! - [`logging`] - Tracing-based logging integration

pub mod error;
pub mod logging;
pub mod messages;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{FormmapError, FormmapResult, ValidationError};
pub use messages::{Message, MessageLevel, MessageStorage, MESSAGE_TAG};
pub use settings::Settings;
