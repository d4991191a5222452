//! Named value filters.
//!
//! Filters run after conversion when a field is projected onto a target
//! object. Each filter is a pure function from one value to the next; a field
//! lists filter names and they are applied in declared order. Names are
//! resolved through a [`FilterRegistry`], and a schema checks every declared
//! name at load time so an unknown filter never reaches a request.
//!
//! Built-in filters:
//!
//! - `passwordHash` - one-way bcrypt hash of the value
//! - `like` - wraps the value as `%value%` for SQL `LIKE` matching

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use formmap_core::settings::PASSWORD_HASH_COST_RANGE;
use formmap_core::{FormmapError, FormmapResult};

use crate::value::FieldValue;

/// A named transformation applied to a converted field value.
pub trait ValueFilter: Send + Sync {
    /// Returns the filter name as written in definitions.
    fn name(&self) -> &str;

    /// Applies the filter to a value.
    fn apply(&self, value: &FieldValue) -> FormmapResult<FieldValue>;

    /// Checks the filter's own configuration. Runs at load time for every
    /// filter a field declares.
    fn check(&self) -> FormmapResult<()> {
        Ok(())
    }
}

/// Normalizes a declared filter name: surrounding whitespace is ignored and
/// the first letter is case-insensitive (`PasswordHash` == `passwordHash`).
pub fn canonical_name(name: &str) -> String {
    let name = name.trim();
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_lowercase().chain(chars).collect()
    })
}

/// A registry of available value filters.
///
/// # Examples
///
/// ```
/// use formmap_forms::filters::FilterRegistry;
/// use formmap_forms::value::FieldValue;
///
/// let registry = FilterRegistry::default();
/// let out = registry.apply("like", &FieldValue::from("foo")).unwrap();
/// assert_eq!(out, FieldValue::from("%foo%"));
/// assert!(registry.contains("Like"));
/// assert!(!registry.contains("slugify"));
/// ```
#[derive(Clone)]
pub struct FilterRegistry {
    filters: HashMap<String, Arc<dyn ValueFilter>>,
}

impl FilterRegistry {
    /// Creates a new empty filter registry.
    pub fn new() -> Self {
        Self {
            filters: HashMap::new(),
        }
    }

    /// Creates a registry holding the built-in filters.
    pub fn with_builtins(password_hash_cost: u32) -> Self {
        let mut r = Self::new();
        r.register(Arc::new(PasswordHashFilter {
            cost: password_hash_cost,
        }));
        r.register(Arc::new(LikeFilter));
        r
    }

    /// Registers a filter, replacing any filter with the same name.
    pub fn register(&mut self, filter: Arc<dyn ValueFilter>) {
        self.filters.insert(canonical_name(filter.name()), filter);
    }

    /// Registers a closure as a filter.
    pub fn register_fn<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&FieldValue) -> FormmapResult<FieldValue> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnFilter {
            name: name.to_string(),
            f: Box::new(f),
        }));
    }

    /// Returns `true` if a filter is registered under the name.
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(&canonical_name(name))
    }

    /// Returns the registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Checks that a filter is registered and correctly configured.
    pub fn check(&self, name: &str) -> FormmapResult<()> {
        self.filters
            .get(&canonical_name(name))
            .ok_or_else(|| FormmapError::UnknownFilter {
                field: String::new(),
                filter: name.to_string(),
            })?
            .check()
    }

    /// Applies a named filter to a value.
    pub fn apply(&self, name: &str, value: &FieldValue) -> FormmapResult<FieldValue> {
        let filter = self
            .filters
            .get(&canonical_name(name))
            .ok_or_else(|| FormmapError::UnknownFilter {
                field: String::new(),
                filter: name.to_string(),
            })?;
        filter.apply(value)
    }

    /// Applies a chain of filters in order, each consuming the previous output.
    ///
    /// An absent value or an empty string passes through untouched.
    pub fn apply_chain<S: AsRef<str>>(
        &self,
        names: &[S],
        value: FieldValue,
    ) -> FormmapResult<FieldValue> {
        if names.is_empty() || value.is_null() || value.as_str() == Some("") {
            return Ok(value);
        }
        names
            .iter()
            .try_fold(value, |acc, name| self.apply(name.as_ref(), &acc))
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_builtins(bcrypt::DEFAULT_COST)
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.names())
            .finish()
    }
}

struct FnFilter {
    name: String,
    f: Box<dyn Fn(&FieldValue) -> FormmapResult<FieldValue> + Send + Sync>,
}

impl ValueFilter for FnFilter {
    fn name(&self) -> &str {
        &self.name
    }
    fn apply(&self, value: &FieldValue) -> FormmapResult<FieldValue> {
        (self.f)(value)
    }
}

// ============================================================
// Built-in filters
// ============================================================

/// One-way bcrypt hash of the value's text.
struct PasswordHashFilter {
    cost: u32,
}

impl ValueFilter for PasswordHashFilter {
    fn name(&self) -> &str {
        "passwordHash"
    }
    fn apply(&self, value: &FieldValue) -> FormmapResult<FieldValue> {
        bcrypt::hash(value.to_string(), self.cost)
            .map(FieldValue::String)
            .map_err(|e| FormmapError::FilterError {
                filter: "passwordHash".to_string(),
                message: format!("Bcrypt hash error: {e}"),
            })
    }
    fn check(&self) -> FormmapResult<()> {
        if PASSWORD_HASH_COST_RANGE.contains(&self.cost) {
            Ok(())
        } else {
            Err(FormmapError::ConfigurationError(format!(
                "passwordHash cost must be between {} and {}, got {}",
                PASSWORD_HASH_COST_RANGE.start(),
                PASSWORD_HASH_COST_RANGE.end(),
                self.cost
            )))
        }
    }
}

/// Wraps the value as `%value%`.
struct LikeFilter;

impl ValueFilter for LikeFilter {
    fn name(&self) -> &str {
        "like"
    }
    fn apply(&self, value: &FieldValue) -> FormmapResult<FieldValue> {
        Ok(FieldValue::String(format!("%{value}%")))
    }
}
