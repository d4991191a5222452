//! Parsed form definitions.
//!
//! A definition document maps `namespace -> form_id -> form`, where each form
//! declares the class of the object it generates, an optional key prefix, and
//! its fields (under `fields` or `elements`):
//!
//! ```json
//! {
//!   "user": {
//!     "login": {
//!       "class": "LoginForm",
//!       "prefix": "login_",
//!       "fields": {
//!         "id":       { "form_type": "text", "var_type": "alphanumeric", "name": "ID",
//!                       "required": true, "max": 32, "property": "account.id" },
//!         "password": { "form_type": "password", "var_type": "string", "name": "Password",
//!                       "required": true, "property": "account.password",
//!                       "filters": "passwordHash" }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! A [`Schema`] holds every loaded field once, keyed by `prefix + id`. Form
//! groups refer to their fields by key, so every group view resolves to the
//! same field as the flat index. A schema is immutable once shared; see
//! [`SchemaStore`](crate::registry::SchemaStore).

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use formmap_core::settings_loader::toml_to_json;
use formmap_core::{FormmapError, FormmapResult, Settings};

use crate::fields::{self, FieldDef, FieldRecord};
use crate::filters::FilterRegistry;

/// The text format of a definition source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// JSON.
    Json,
    /// TOML.
    Toml,
}

impl Format {
    /// Picks the format from a file extension; anything but `.toml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// Where a definition document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// A definition file. A path that does not exist is retried by file name
    /// inside the configured definition directory.
    File(PathBuf),
    /// Definition text with an explicit source identifier.
    Text {
        /// Identifier used to recognise repeated loads.
        id: String,
        /// The text format.
        format: Format,
        /// The document.
        text: String,
    },
}

impl SchemaSource {
    /// A definition file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// JSON definition text.
    pub fn json(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            id: id.into(),
            format: Format::Json,
            text: text.into(),
        }
    }

    /// TOML definition text.
    pub fn toml(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            id: id.into(),
            format: Format::Toml,
            text: text.into(),
        }
    }
}

/// One form: a namespace/form-id pair, its target class, and its field keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormGroup {
    /// The namespace the form belongs to.
    pub namespace: String,
    /// The form id.
    pub form_id: String,
    /// The class name of the object generated from this form.
    pub target_class: String,
    /// The prefix applied to every field id of this form.
    pub prefix: String,
    /// Composite keys of the form's fields, in declared order.
    pub keys: Vec<String>,
}

/// Loaded form definitions.
///
/// # Examples
///
/// ```
/// use formmap_forms::Schema;
///
/// let mut schema = Schema::new();
/// schema
///     .load_str(
///         "inline",
///         r#"{"shop": {"search": {"class": "SearchQuery", "fields": {
///             "q": {"form_type": "search", "var_type": "string", "property": "keyword",
///                   "filters": ["like"]}
///         }}}}"#,
///     )
///     .unwrap();
///
/// assert!(schema.field("q").is_some());
/// assert_eq!(schema.target_class("shop", "search"), Some("SearchQuery"));
/// ```
#[derive(Debug, Clone)]
pub struct Schema {
    fields: IndexMap<String, Arc<FieldDef>>,
    groups: IndexMap<String, IndexMap<String, FormGroup>>,
    loaded_sources: HashSet<String>,
    filters: FilterRegistry,
    definition_dir: Option<PathBuf>,
}

impl Schema {
    /// Creates an empty schema with the built-in filters.
    pub fn new() -> Self {
        Self::with_filters(FilterRegistry::default())
    }

    /// Creates an empty schema using the given filter registry.
    pub fn with_filters(filters: FilterRegistry) -> Self {
        Self {
            fields: IndexMap::new(),
            groups: IndexMap::new(),
            loaded_sources: HashSet::new(),
            filters,
            definition_dir: None,
        }
    }

    /// Creates an empty schema configured from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut schema = Self::with_filters(FilterRegistry::with_builtins(
            settings.password_hash_cost,
        ));
        schema.definition_dir.clone_from(&settings.definition_dir);
        schema
    }

    /// Sets the directory searched for definition files given by bare name.
    #[must_use]
    pub fn definition_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.definition_dir = Some(dir.into());
        self
    }

    /// The filter registry used to check and apply field filters.
    pub const fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    /// Mutable access to the filter registry, for registering custom filters
    /// before loading definitions that use them.
    pub fn filters_mut(&mut self) -> &mut FilterRegistry {
        &mut self.filters
    }

    /// Loads JSON definition text under the given source id.
    pub fn load_str(&mut self, id: &str, text: &str) -> FormmapResult<bool> {
        self.load(&SchemaSource::json(id, text))
    }

    /// Loads a definition file.
    pub fn load_file(&mut self, path: impl Into<PathBuf>) -> FormmapResult<bool> {
        self.load(&SchemaSource::file(path))
    }

    /// Loads a definition source.
    ///
    /// Returns `Ok(false)` when the source was already loaded. On error the
    /// schema is left exactly as it was.
    pub fn load(&mut self, source: &SchemaSource) -> FormmapResult<bool> {
        let (id, format, text) = match source {
            SchemaSource::File(path) => {
                let resolved = self.resolve_path(path)?;
                let id = resolved.display().to_string();
                if self.loaded_sources.contains(&id) {
                    tracing::debug!(source = %id, "definition source already loaded");
                    return Ok(false);
                }
                let text = fs::read_to_string(&resolved)?;
                (id, Format::from_path(&resolved), text)
            }
            SchemaSource::Text { id, format, text } => (id.clone(), *format, text.clone()),
        };

        if self.loaded_sources.contains(&id) {
            tracing::debug!(source = %id, "definition source already loaded");
            return Ok(false);
        }

        let document = parse_document(&id, format, &text)?;
        let staged = self.stage(&id, document)?;

        let mut field_count = 0;
        for (group, defs) in staged {
            field_count += defs.len();
            for def in defs {
                self.fields.insert(def.key(), Arc::new(def));
            }
            let forms = self.groups.entry(group.namespace.clone()).or_default();
            match forms.get_mut(&group.form_id) {
                // a form declared again extends the existing group
                Some(existing) => {
                    existing.target_class = group.target_class;
                    existing.prefix = group.prefix;
                    for key in group.keys {
                        if !existing.keys.contains(&key) {
                            existing.keys.push(key);
                        }
                    }
                }
                None => {
                    forms.insert(group.form_id.clone(), group);
                }
            }
        }
        self.loaded_sources.insert(id.clone());

        tracing::debug!(source = %id, fields = field_count, "loaded definition source");
        Ok(true)
    }

    fn resolve_path(&self, path: &Path) -> FormmapResult<PathBuf> {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        if let (Some(dir), Some(name)) = (&self.definition_dir, path.file_name()) {
            let candidate = dir.join(name);
            if candidate.exists() {
                return Ok(candidate);
            }
            return Err(FormmapError::SourceNotFound(candidate.display().to_string()));
        }
        Err(FormmapError::SourceNotFound(path.display().to_string()))
    }

    /// Builds every group and field of a document without touching `self`.
    fn stage(
        &self,
        source_id: &str,
        document: serde_json::Value,
    ) -> FormmapResult<Vec<(FormGroup, Vec<FieldDef>)>> {
        let malformed = |message: String| FormmapError::DefinitionError {
            source_id: source_id.to_string(),
            message,
        };

        let serde_json::Value::Object(namespaces) = document else {
            return Err(malformed("top level must be a table of namespaces".into()));
        };

        let mut staged = Vec::new();
        for (namespace, forms) in namespaces {
            let serde_json::Value::Object(forms) = forms else {
                return Err(malformed(format!("namespace '{namespace}' must be a table")));
            };
            for (form_id, form) in forms {
                let serde_json::Value::Object(mut form) = form else {
                    return Err(malformed(format!("form '{namespace}.{form_id}' must be a table")));
                };

                let target_class = match form.remove("class") {
                    Some(serde_json::Value::String(class)) => class,
                    _ => {
                        return Err(malformed(format!(
                            "form '{namespace}.{form_id}' has no class"
                        )))
                    }
                };
                let prefix = match form.remove("prefix") {
                    None | Some(serde_json::Value::Null) => String::new(),
                    Some(serde_json::Value::String(prefix)) => prefix,
                    Some(_) => {
                        return Err(malformed(format!(
                            "form '{namespace}.{form_id}' has a non-string prefix"
                        )))
                    }
                };
                let records = match form.remove("fields").or_else(|| form.remove("elements")) {
                    Some(serde_json::Value::Object(records)) => records,
                    None => serde_json::Map::new(),
                    Some(_) => {
                        return Err(malformed(format!(
                            "fields of '{namespace}.{form_id}' must be a table"
                        )))
                    }
                };

                let mut keys = Vec::with_capacity(records.len());
                let mut defs = Vec::with_capacity(records.len());
                for (field_id, record) in records {
                    let record: FieldRecord = serde_json::from_value(record).map_err(|e| {
                        malformed(format!("field '{prefix}{field_id}': {e}"))
                    })?;
                    let def = fields::generate(&field_id, &prefix, record)?;
                    self.check_filters(&def)?;
                    keys.push(def.key());
                    defs.push(def);
                }

                staged.push((
                    FormGroup {
                        namespace: namespace.clone(),
                        form_id,
                        target_class,
                        prefix,
                        keys,
                    },
                    defs,
                ));
            }
        }
        Ok(staged)
    }

    fn check_filters(&self, def: &FieldDef) -> FormmapResult<()> {
        def.filters.iter().try_for_each(|name| {
            self.filters.check(name).map_err(|e| match e {
                FormmapError::UnknownFilter { filter, .. } => FormmapError::UnknownFilter {
                    field: def.key(),
                    filter,
                },
                other => other,
            })
        })
    }

    /// Returns the field with the given composite key.
    pub fn field(&self, key: &str) -> Option<&Arc<FieldDef>> {
        self.fields.get(key)
    }

    /// Iterates over all fields in load order.
    pub fn fields(&self) -> impl Iterator<Item = &Arc<FieldDef>> {
        self.fields.values()
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no field is loaded.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the form registered under a namespace and form id.
    pub fn group(&self, namespace: &str, form_id: &str) -> Option<&FormGroup> {
        self.groups.get(namespace).and_then(|forms| forms.get(form_id))
    }

    /// Returns the first form with the given id, searching namespaces in load order.
    pub fn find_group(&self, form_id: &str) -> Option<&FormGroup> {
        self.groups.values().find_map(|forms| forms.get(form_id))
    }

    /// Iterates over every form, grouped by namespace in load order.
    pub fn groups(&self) -> impl Iterator<Item = &FormGroup> {
        self.groups.values().flat_map(IndexMap::values)
    }

    /// The class name declared for a form.
    pub fn target_class(&self, namespace: &str, form_id: &str) -> Option<&str> {
        self.group(namespace, form_id)
            .map(|group| group.target_class.as_str())
    }

    /// Returns `true` if a source with this identifier was loaded.
    pub fn is_loaded(&self, source_id: &str) -> bool {
        self.loaded_sources.contains(source_id)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_document(source_id: &str, format: Format, text: &str) -> FormmapResult<serde_json::Value> {
    let malformed = |message: String| FormmapError::DefinitionError {
        source_id: source_id.to_string(),
        message,
    };
    match format {
        Format::Json => serde_json::from_str(text).map_err(|e| malformed(e.to_string())),
        Format::Toml => toml::from_str::<toml::Value>(text)
            .map(toml_to_json)
            .map_err(|e| malformed(e.to_string())),
    }
}
