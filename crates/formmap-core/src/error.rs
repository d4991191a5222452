//! Core error types for the formmap-rs engine.
//!
//! This module provides the [`FormmapError`] enum that covers configuration
//! failures raised while loading definitions, filter failures raised while
//! projecting values, and I/O and serialization failures. Per-field
//! validation failures are not errors in this sense: they are reported as
//! [`ValidationError`] values and recorded in the message sink.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// A single failed validation check on a field.
///
/// # Examples
///
/// ```
/// use formmap_core::error::ValidationError;
///
/// let err = ValidationError::new("「Age」 is required.", "required")
///     .with_param("field", "age");
/// assert_eq!(err.code, "required");
/// assert_eq!(err.params.get("field").unwrap(), "age");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The human-readable message.
    pub message: String,
    /// A short code identifying the check that failed (e.g. "required", "max").
    pub code: String,
    /// Additional parameters providing context for the message.
    pub params: HashMap<String, String>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
        }
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for the formmap-rs engine.
///
/// Configuration variants are fatal setup failures: a definition source that
/// cannot be located or parsed, or a definition that names an unknown form
/// type, var type, filter, or form group. See [`FormmapError::is_configuration`].
#[derive(Error, Debug)]
pub enum FormmapError {
    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A definition source could not be located.
    #[error("Definition source not found: {0}")]
    SourceNotFound(String),

    /// A definition source is malformed.
    #[error("Invalid definition in '{source_id}': {message}")]
    DefinitionError {
        /// The identifier of the offending source.
        source_id: String,
        /// What was wrong with it.
        message: String,
    },

    /// A field record declares a form type with no field variant.
    #[error("Unknown form type '{form_type}' for field '{field}'")]
    UnknownFormType {
        /// The composite key of the field.
        field: String,
        /// The declared form type.
        form_type: String,
    },

    /// A field record declares a var type with no validation semantics.
    #[error("Unknown var type '{var_type}' for field '{field}'")]
    UnknownVarType {
        /// The composite key of the field.
        field: String,
        /// The declared var type.
        var_type: String,
    },

    /// A field declares a filter that is not registered.
    #[error("Unknown filter '{filter}' for field '{field}'")]
    UnknownFilter {
        /// The composite key of the field.
        field: String,
        /// The filter name.
        filter: String,
    },

    /// No form group is registered under the given namespace/form id.
    #[error("Unknown form '{0}'")]
    UnknownForm(String),

    // ── Projection ───────────────────────────────────────────────────

    /// A filter failed while transforming a value.
    #[error("Filter '{filter}' failed: {message}")]
    FilterError {
        /// The filter name.
        filter: String,
        /// The underlying failure.
        message: String,
    },

    /// A value could not be written at a property path.
    #[error("Cannot assign property '{0}'")]
    PropertyPath(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FormmapError {
    /// Returns `true` for unrecoverable setup failures.
    ///
    /// These abort a load and must be fixed in the definitions or settings;
    /// callers should not retry.
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::ConfigurationError(_)
                | Self::SourceNotFound(_)
                | Self::DefinitionError { .. }
                | Self::UnknownFormType { .. }
                | Self::UnknownVarType { .. }
                | Self::UnknownFilter { .. }
                | Self::UnknownForm(_)
        )
    }
}

impl From<serde_json::Error> for FormmapError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// A convenience type alias for `Result<T, FormmapError>`.
pub type FormmapResult<T> = Result<T, FormmapError>;
