//! Settings for the formmap-rs engine.
//!
//! [`Settings`] holds everything that is configured once per process: where
//! definition files live, how strictly string var types are checked, and how
//! logging is set up. Load it with [`settings_loader`](crate::settings_loader).

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::FormmapError;
use crate::messages::MESSAGE_TAG;

/// Bcrypt costs accepted for [`Settings::password_hash_cost`].
pub const PASSWORD_HASH_COST_RANGE: RangeInclusive<u32> = 4..=31;

/// The complete set of engine settings.
///
/// # Examples
///
/// ```
/// use formmap_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.strict_charset);
/// assert!(!settings.validate_null_safe);
/// assert_eq!(settings.message_tag, "formmap");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,

    // ── Definitions ──────────────────────────────────────────────────

    /// Directory searched for definition files given by bare file name.
    pub definition_dir: Option<PathBuf>,

    // ── Validation ───────────────────────────────────────────────────

    /// Skip validation of every absent value, regardless of the per-field flag.
    pub validate_null_safe: bool,
    /// Match string var types against the whole value instead of its first character.
    pub strict_charset: bool,
    /// Tag attached to every message the validator records.
    pub message_tag: String,

    // ── Filters ──────────────────────────────────────────────────────

    /// The bcrypt cost used by the `passwordHash` filter.
    pub password_hash_cost: u32,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level (e.g. "info", "debug", "warn").
    pub log_level: String,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            definition_dir: None,
            validate_null_safe: false,
            strict_charset: true,
            message_tag: MESSAGE_TAG.to_string(),
            password_hash_cost: 12,
            log_level: "info".to_string(),
            extra: HashMap::new(),
        }
    }
}

impl Settings {
    /// Rejects values that would only fail later, while handling a request.
    pub fn check(&self) -> Result<(), FormmapError> {
        if !PASSWORD_HASH_COST_RANGE.contains(&self.password_hash_cost) {
            return Err(FormmapError::ConfigurationError(format!(
                "password_hash_cost must be between {} and {}, got {}",
                PASSWORD_HASH_COST_RANGE.start(),
                PASSWORD_HASH_COST_RANGE.end(),
                self.password_hash_cost
            )));
        }
        Ok(())
    }
}
