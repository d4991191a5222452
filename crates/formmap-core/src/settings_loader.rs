//! Settings loading from configuration files.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `FORMMAP_DEBUG` | `debug` |
//! | `FORMMAP_DEFINITION_DIR` | `definition_dir` |
//! | `FORMMAP_VALIDATE_NULL_SAFE` | `validate_null_safe` |
//! | `FORMMAP_STRICT_CHARSET` | `strict_charset` |
//! | `FORMMAP_MESSAGE_TAG` | `message_tag` |
//! | `FORMMAP_PASSWORD_HASH_COST` | `password_hash_cost` |
//! | `FORMMAP_LOG_LEVEL` | `log_level` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use formmap_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/formmap.toml").unwrap();
//! ```

use std::path::{Path, PathBuf};

use crate::error::FormmapError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Any fields not present in the TOML keep their default values.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, FormmapError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| FormmapError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    from_json_value(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, FormmapError> {
    from_toml_str(&read_config(path.as_ref(), "TOML")?)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, FormmapError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    settings.check()?;
    Ok(settings)
}

/// Loads settings from a JSON string.
pub fn from_json_str(json_str: &str) -> Result<Settings, FormmapError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| FormmapError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;

    from_json_value(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, FormmapError> {
    from_json_str(&read_config(path.as_ref(), "JSON")?)
}

/// Loads settings from a JSON file and then applies environment variable overrides.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> Result<Settings, FormmapError> {
    let mut settings = from_json_file(path)?;
    apply_env_overrides(&mut settings);
    settings.check()?;
    Ok(settings)
}

/// Loads settings from a file, picking the format from its extension.
///
/// `.json` files are read as JSON; anything else is read as TOML.
pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Settings, FormmapError> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        from_json_file_with_env(path)
    } else {
        from_toml_file_with_env(path)
    }
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `FORMMAP_*` environment variable overrides to a settings struct.
///
/// Boolean variables accept "true"/"1"/"yes"; anything else is `false`.
/// Unparseable numbers are ignored.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("FORMMAP_DEBUG") {
        settings.debug = parse_flag(&val);
    }

    if let Ok(val) = std::env::var("FORMMAP_DEFINITION_DIR") {
        settings.definition_dir = if val.is_empty() {
            None
        } else {
            Some(PathBuf::from(val))
        };
    }

    if let Ok(val) = std::env::var("FORMMAP_VALIDATE_NULL_SAFE") {
        settings.validate_null_safe = parse_flag(&val);
    }

    if let Ok(val) = std::env::var("FORMMAP_STRICT_CHARSET") {
        settings.strict_charset = parse_flag(&val);
    }

    if let Ok(val) = std::env::var("FORMMAP_MESSAGE_TAG") {
        settings.message_tag = val;
    }

    if let Ok(val) = std::env::var("FORMMAP_PASSWORD_HASH_COST") {
        if let Ok(cost) = val.parse::<u32>() {
            settings.password_hash_cost = cost;
        }
    }

    if let Ok(val) = std::env::var("FORMMAP_LOG_LEVEL") {
        settings.log_level = val;
    }
}

// ============================================================
// Helpers
// ============================================================

fn parse_flag(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn read_config(path: &Path, format: &str) -> Result<String, FormmapError> {
    std::fs::read_to_string(path).map_err(|e| {
        FormmapError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

/// Merges a parsed document over the default settings and deserializes it.
fn from_json_value(value: serde_json::Value, format: &str) -> Result<Settings, FormmapError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        FormmapError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    let settings: Settings = serde_json::from_value(merged).map_err(|e| {
        FormmapError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })?;
    settings.check()?;
    Ok(settings)
}

/// Converts a TOML value to a `serde_json::Value`.
pub fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            debug = false
            definition_dir = "/srv/formmap"
            strict_charset = false
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.definition_dir, Some(PathBuf::from("/srv/formmap")));
        assert!(!settings.strict_charset);
        // Defaults preserved
        assert_eq!(settings.message_tag, "formmap");
        assert_eq!(settings.password_hash_cost, 12);
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert!(settings.strict_charset);
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let result = from_toml_str("debug = [");
        assert!(matches!(result, Err(FormmapError::ConfigurationError(_))));
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        let result = from_toml_str("password_hash_cost = \"high\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_hash_cost_rejected() {
        let result = from_toml_str("password_hash_cost = 2");
        assert!(matches!(result, Err(FormmapError::ConfigurationError(_))));
        let result = from_json_str(r#"{"password_hash_cost": 40}"#);
        assert!(matches!(result, Err(FormmapError::ConfigurationError(_))));
        assert_eq!(from_toml_str("password_hash_cost = 4").unwrap().password_hash_cost, 4);
    }

    #[test]
    fn test_from_toml_str_extra() {
        let toml = r#"
            [extra]
            theme = "dark"
        "#;
        let settings = from_toml_str(toml).unwrap();
        assert_eq!(
            settings.extra.get("theme"),
            Some(&serde_json::Value::String("dark".into()))
        );
    }

    #[test]
    fn test_from_json_str_basic() {
        let json = r#"{"validate_null_safe": true, "log_level": "debug"}"#;
        let settings = from_json_str(json).unwrap();
        assert!(settings.validate_null_safe);
        assert_eq!(settings.log_level, "debug");
        assert!(settings.strict_charset);
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert!(from_json_str("{not json").is_err());
    }

    #[test]
    fn test_from_file_missing() {
        let result = from_toml_file("/nonexistent/formmap.toml");
        assert!(matches!(result, Err(FormmapError::ConfigurationError(_))));
    }

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"a": {"b": 1, "c": 2}, "d": 3});
        let over = serde_json::json!({"a": {"b": 10}});
        let merged = merge_json(base, over);
        assert_eq!(merged, serde_json::json!({"a": {"b": 10, "c": 2}, "d": 3}));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("off"));
    }
}
