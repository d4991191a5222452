//! Object generation.
//!
//! A form declares the class of the object it produces. Generation walks the
//! form's fields in order and writes each field's converted and filtered
//! value at its dotted property path. Fields without a property are skipped.
//! The session's bound values are not modified.

use serde::de::DeserializeOwned;
use serde::Serialize;

use formmap_core::{FormmapError, FormmapResult};

use crate::registry::FormSession;
use crate::value::FieldValue;

/// A target that accepts values at dotted property paths.
pub trait PathBinder {
    /// Writes `value` at `path` (`"a.b.c"`), creating intermediate structure.
    fn set_path_value(&mut self, path: &str, value: FieldValue) -> FormmapResult<()>;
}

/// A generated object: its declared class and its properties as JSON.
///
/// # Examples
///
/// ```
/// use formmap_forms::{FieldValue, PathBinder, TargetObject};
///
/// let mut user = TargetObject::new("User");
/// user.set_path_value("profile.age", FieldValue::Int(30)).unwrap();
/// user.set_path_value("name", FieldValue::from("alice")).unwrap();
///
/// assert_eq!(user.get_path("profile.age"), Some(&serde_json::json!(30)));
/// assert_eq!(user.class(), "User");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetObject {
    class: String,
    properties: serde_json::Map<String, serde_json::Value>,
}

impl TargetObject {
    /// Creates an empty object of the given class.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            properties: serde_json::Map::new(),
        }
    }

    /// The declared class name.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// The top-level properties.
    pub const fn properties(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.properties
    }

    /// Reads the value at a dotted path.
    pub fn get_path(&self, path: &str) -> Option<&serde_json::Value> {
        let mut segments = path.split('.');
        let first = self.properties.get(segments.next()?)?;
        segments.try_fold(first, |node, segment| node.get(segment))
    }

    /// Converts the properties into JSON.
    pub fn into_json(self) -> serde_json::Value {
        serde_json::Value::Object(self.properties)
    }

    /// Deserializes the properties into a typed value.
    pub fn deserialize<T: DeserializeOwned>(self) -> FormmapResult<T> {
        let class = self.class.clone();
        serde_json::from_value(self.into_json()).map_err(|e| {
            FormmapError::SerializationError(format!("cannot build '{class}': {e}"))
        })
    }
}

impl PathBinder for TargetObject {
    fn set_path_value(&mut self, path: &str, value: FieldValue) -> FormmapResult<()> {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(FormmapError::PropertyPath(format!(
                "'{path}' has an empty segment"
            )));
        }
        let Some((last, parents)) = segments.split_last() else {
            return Err(FormmapError::PropertyPath("empty path".to_string()));
        };

        let mut node = &mut self.properties;
        for segment in parents {
            let child = node
                .entry((*segment).to_string())
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
            if child.is_null() {
                *child = serde_json::Value::Object(serde_json::Map::new());
            }
            node = child.as_object_mut().ok_or_else(|| {
                FormmapError::PropertyPath(format!(
                    "'{segment}' in '{path}' already holds a non-object value"
                ))
            })?;
        }
        node.insert((*last).to_string(), value.to_json());
        Ok(())
    }
}

impl PathBinder for serde_json::Map<String, serde_json::Value> {
    fn set_path_value(&mut self, path: &str, value: FieldValue) -> FormmapResult<()> {
        let mut target = TargetObject {
            class: String::new(),
            properties: std::mem::take(self),
        };
        let result = target.set_path_value(path, value);
        *self = target.properties;
        result
    }
}

impl FormSession {
    /// Generates the declared object of a form.
    pub fn generate(&self, namespace: &str, form_id: &str) -> FormmapResult<TargetObject> {
        let class = self.group(namespace, form_id)?.target_class.clone();
        let mut object = TargetObject::new(class);
        self.generate_into(namespace, form_id, &mut object)?;
        Ok(object)
    }

    /// Writes a form's projected values into an existing target.
    pub fn generate_into<T: PathBinder + ?Sized>(
        &self,
        namespace: &str,
        form_id: &str,
        target: &mut T,
    ) -> FormmapResult<()> {
        let filters = self.schema.filters();
        for field in self.group_fields(namespace, form_id)? {
            let Some(path) = field.def().property.as_deref() else {
                continue;
            };
            let value = field.project(filters).map_err(|e| match e {
                FormmapError::UnknownFilter { filter, .. } => FormmapError::UnknownFilter {
                    field: field.key(),
                    filter,
                },
                other => other,
            })?;
            target.set_path_value(path, value)?;
        }
        tracing::debug!(namespace, form = form_id, "generated object");
        Ok(())
    }

    /// Generates a form and deserializes it into `T`.
    pub fn generate_as<T: DeserializeOwned>(&self, namespace: &str, form_id: &str) -> FormmapResult<T> {
        self.generate(namespace, form_id)?.deserialize()
    }
}
