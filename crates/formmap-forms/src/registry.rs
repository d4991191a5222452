//! Shared schemas and per-request sessions.
//!
//! [`SchemaStore`] owns the current [`Schema`] behind an `Arc`. Loading a new
//! source builds a fresh schema and swaps it in; requests already running
//! keep the snapshot they started with.
//!
//! [`FormSession`] is the state of one request: a bound value for every
//! field, the validation messages, and the bound flag. Binding lives in
//! [`binder`](crate::binder) and object generation in
//! [`generator`](crate::generator).

use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;

use formmap_core::{FormmapError, FormmapResult, MessageStorage, Settings};

use crate::bound_field::BoundField;
use crate::schema::{FormGroup, Schema, SchemaSource};
use crate::validation::{self, ValidationContext};
use crate::value::FieldValue;

/// The process-wide holder of the current schema.
///
/// # Examples
///
/// ```
/// use formmap_forms::{SchemaSource, SchemaStore};
/// use formmap_core::Settings;
///
/// let store = SchemaStore::new(Settings::default());
/// store
///     .load(&SchemaSource::json(
///         "contact",
///         r#"{"site": {"contact": {"class": "Inquiry", "fields": {
///             "email": {"form_type": "text", "var_type": "email", "required": true,
///                       "property": "email"}
///         }}}}"#,
///     ))
///     .unwrap();
///
/// let session = store.session();
/// assert!(session.field("email").is_some());
/// ```
#[derive(Debug)]
pub struct SchemaStore {
    current: RwLock<Arc<Schema>>,
    settings: Settings,
}

impl SchemaStore {
    /// Creates a store holding an empty schema configured from `settings`.
    pub fn new(settings: Settings) -> Self {
        let schema = Schema::from_settings(&settings);
        Self::with_schema(schema, settings)
    }

    /// Creates a store around an existing schema.
    pub fn with_schema(schema: Schema, settings: Settings) -> Self {
        Self {
            current: RwLock::new(Arc::new(schema)),
            settings,
        }
    }

    /// The settings sessions are created with.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Loads a source into a copy of the current schema and publishes it.
    ///
    /// Returns `Ok(false)` if the source was already loaded. On error the
    /// current schema is unchanged.
    pub fn load(&self, source: &SchemaSource) -> FormmapResult<bool> {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut next = Schema::clone(&current);
        let loaded = next.load(source)?;
        if loaded {
            *current = Arc::new(next);
            tracing::info!(fields = current.len(), "published schema");
        }
        Ok(loaded)
    }

    /// Returns the current schema.
    pub fn snapshot(&self) -> Arc<Schema> {
        Arc::clone(
            &self
                .current
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Opens a session over the current schema.
    pub fn session(&self) -> FormSession {
        FormSession::new(
            self.snapshot(),
            ValidationContext::from_settings(&self.settings),
        )
    }
}

impl Default for SchemaStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

/// The bound values and messages of one request.
#[derive(Debug, Clone)]
pub struct FormSession {
    pub(crate) schema: Arc<Schema>,
    pub(crate) fields: IndexMap<String, BoundField>,
    pub(crate) messages: MessageStorage,
    pub(crate) bound: bool,
    pub(crate) ctx: ValidationContext,
}

impl FormSession {
    /// Opens a session over a schema; every field starts at its initial value.
    pub fn new(schema: Arc<Schema>, ctx: ValidationContext) -> Self {
        let fields = schema
            .fields()
            .map(|def| (def.key(), BoundField::new(Arc::clone(def))))
            .collect();
        Self {
            schema,
            fields,
            messages: MessageStorage::new(),
            bound: false,
            ctx,
        }
    }

    /// The schema this session reads.
    pub const fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Whether request data has been bound since the last load.
    pub const fn is_bound(&self) -> bool {
        self.bound
    }

    /// Loads an extra source for this session only.
    ///
    /// The shared schema is copied on first write; other sessions are not
    /// affected. A successful load marks the session unbound so the next
    /// [`bind`](Self::bind) runs again.
    pub fn load(&mut self, source: &SchemaSource) -> FormmapResult<bool> {
        let mut next = Schema::clone(&self.schema);
        if !next.load(source)? {
            return Ok(false);
        }
        self.schema = Arc::new(next);

        for def in self.schema.fields() {
            let key = def.key();
            let stale = self
                .fields
                .get(&key)
                .map_or(true, |field| !Arc::ptr_eq(field.def_arc(), def));
            if stale {
                self.fields.insert(key, BoundField::new(Arc::clone(def)));
            }
        }
        self.bound = false;
        Ok(true)
    }

    /// Returns the field with the given composite key.
    pub fn field(&self, key: &str) -> Option<&BoundField> {
        self.fields.get(key)
    }

    /// Returns the field with the given composite key, mutably.
    pub fn field_mut(&mut self, key: &str) -> Option<&mut BoundField> {
        self.fields.get_mut(key)
    }

    /// Returns the bound value of a field.
    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key).map(BoundField::value)
    }

    /// Iterates over every field, declared ones first, then ad-hoc ones in
    /// the order they were bound.
    pub fn fields(&self) -> impl Iterator<Item = &BoundField> {
        self.fields.values()
    }

    /// Returns a form group, or an error naming the missing form.
    pub fn group(&self, namespace: &str, form_id: &str) -> FormmapResult<&FormGroup> {
        self.schema
            .group(namespace, form_id)
            .ok_or_else(|| FormmapError::UnknownForm(format!("{namespace}.{form_id}")))
    }

    /// The fields of a form in declared order.
    ///
    /// These are the same entries the flat index holds, so a value bound by
    /// key is visible here.
    pub fn group_fields(&self, namespace: &str, form_id: &str) -> FormmapResult<Vec<&BoundField>> {
        let group = self.group(namespace, form_id)?;
        Ok(self.resolve(group))
    }

    fn resolve(&self, group: &FormGroup) -> Vec<&BoundField> {
        group
            .keys
            .iter()
            .filter_map(|key| self.fields.get(key))
            .collect()
    }

    /// Validates every field, including ad-hoc ones.
    pub fn validate_all(&mut self) -> u32 {
        let count = validation::validate_group(self.fields.values(), &self.ctx, &mut self.messages);
        tracing::debug!(invalid = count, "validated all fields");
        count
    }

    /// Validates the first form with the given id, searching namespaces in
    /// load order.
    pub fn validate_form(&mut self, form_id: &str) -> FormmapResult<u32> {
        let schema = Arc::clone(&self.schema);
        let group = schema
            .find_group(form_id)
            .ok_or_else(|| FormmapError::UnknownForm(form_id.to_string()))?;
        Ok(self.validate_resolved(group))
    }

    /// Validates one form.
    pub fn validate_group(&mut self, namespace: &str, form_id: &str) -> FormmapResult<u32> {
        let schema = Arc::clone(&self.schema);
        let group = schema
            .group(namespace, form_id)
            .ok_or_else(|| FormmapError::UnknownForm(format!("{namespace}.{form_id}")))?;
        Ok(self.validate_resolved(group))
    }

    fn validate_resolved(&mut self, group: &FormGroup) -> u32 {
        let fields = group.keys.iter().filter_map(|key| self.fields.get(key));
        let count = validation::validate_group(fields, &self.ctx, &mut self.messages);
        tracing::debug!(
            namespace = %group.namespace,
            form = %group.form_id,
            invalid = count,
            "validated form"
        );
        count
    }

    /// The messages recorded by validation so far.
    pub const fn messages(&self) -> &MessageStorage {
        &self.messages
    }

    /// Drains the recorded messages.
    pub fn take_messages(&mut self) -> Vec<formmap_core::Message> {
        self.messages.get_messages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "user": {
            "edit": {"class": "User", "prefix": "u_", "fields": {
                "name": {"form_type": "text", "var_type": "string", "required": true},
                "age": {"form_type": "text", "var_type": "int", "value": "20"}
            }}
        },
        "admin": {
            "edit": {"class": "Admin", "fields": {
                "role": {"form_type": "select", "required": true}
            }}
        }
    }"#;

    fn store() -> SchemaStore {
        let store = SchemaStore::default();
        store.load(&SchemaSource::json("doc", DOC)).unwrap();
        store
    }

    #[test]
    fn test_session_starts_with_initial_values() {
        let session = store().session();
        assert_eq!(session.value("u_age"), Some(&FieldValue::from("20")));
        assert!(session.value("u_name").unwrap().is_null());
        assert!(!session.is_bound());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let store = store();
        let mut a = store.session();
        let b = store.session();
        a.field_mut("u_name").unwrap().set_value("alice");
        assert_eq!(a.value("u_name"), Some(&FieldValue::from("alice")));
        assert!(b.value("u_name").unwrap().is_null());
    }

    #[test]
    fn test_store_swap_keeps_old_snapshot() {
        let store = store();
        let before = store.session();
        store
            .load(&SchemaSource::json(
                "extra",
                r#"{"misc": {"note": {"class": "Note", "fields": {"body": {"form_type": "textarea"}}}}}"#,
            ))
            .unwrap();
        assert!(before.field("body").is_none());
        assert!(store.session().field("body").is_some());
    }

    #[test]
    fn test_store_failed_load_keeps_schema() {
        let store = store();
        let err = store
            .load(&SchemaSource::json("bad", r#"{"x": {"y": {"class": "Z", "fields": {"a": {"form_type": "nope"}}}}}"#))
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(store.snapshot().len(), 3);
    }

    #[test]
    fn test_validate_group_and_form() {
        let mut session = store().session();
        assert_eq!(session.validate_group("user", "edit").unwrap(), 1);
        assert_eq!(session.messages().len(), 1);
        assert_eq!(
            session.messages().peek_messages()[0].name.as_deref(),
            Some("u_name")
        );

        // form id lookup takes the first namespace
        assert_eq!(session.validate_form("edit").unwrap(), 1);
        assert_eq!(session.validate_all(), 2);
        assert_eq!(session.take_messages().len(), 4);
        assert!(session.messages().is_empty());
    }

    #[test]
    fn test_unknown_form() {
        let mut session = store().session();
        assert!(matches!(
            session.validate_form("missing"),
            Err(FormmapError::UnknownForm(_))
        ));
        assert!(matches!(
            session.validate_group("user", "missing"),
            Err(FormmapError::UnknownForm(ref name)) if name == "user.missing"
        ));
        assert!(session.group_fields("nope", "edit").is_err());
    }

    #[test]
    fn test_group_fields_see_flat_writes() {
        let mut session = store().session();
        session.field_mut("u_age").unwrap().set_value("33");
        let group = session.group_fields("user", "edit").unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group[1].value(), &FieldValue::from("33"));
    }

    #[test]
    fn test_session_private_load() {
        let store = store();
        let mut session = store.session();
        session.field_mut("u_age").unwrap().set_value("40");
        session.bound = true;

        let loaded = session
            .load(&SchemaSource::json(
                "private",
                r#"{"misc": {"note": {"class": "Note", "fields": {"body": {"form_type": "textarea"}}}}}"#,
            ))
            .unwrap();
        assert!(loaded);
        assert!(!session.is_bound());
        assert!(session.field("body").is_some());
        assert_eq!(session.value("u_age"), Some(&FieldValue::from("40")));
        assert!(store.session().field("body").is_none());
        assert!(!session.load(&SchemaSource::json("private", "{}")).unwrap());
    }
}
