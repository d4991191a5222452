//! Binding request data onto session fields.
//!
//! The three request sources are merged into one ordered map with the query
//! string first, posted fields second, and JSON members last; the first
//! source to carry a key wins. The reserved `url` key is dropped, and a
//! merged `prefix` value scopes every lookup.
//!
//! Image submit buttons post their click position as `name_x` / `name_y`.
//! Such keys are bound to `name` as a list of the posted coordinates.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use formmap_core::{FormmapError, FormmapResult};
use formmap_http::{QueryDict, RequestData};

use crate::bound_field::BoundField;
use crate::registry::FormSession;
use crate::value::FieldValue;

/// Request key removed before binding.
pub const RESERVED_URL_KEY: &str = "url";

/// Request key whose value prefixes every lookup.
pub const PREFIX_KEY: &str = "prefix";

/// Merges the request sources with query > post > JSON priority.
///
/// A query or post key written as `name[]` binds every value under `name`
/// as a list.
///
/// # Examples
///
/// ```
/// use formmap_forms::binder::merge_sources;
/// use formmap_forms::FieldValue;
/// use formmap_http::{QueryDict, RequestData};
///
/// let mut json = serde_json::Map::new();
/// json.insert("x".into(), serde_json::json!("3"));
/// json.insert("z".into(), serde_json::json!(5));
/// let request = RequestData::new(
///     QueryDict::parse("x=1&url=/users"),
///     QueryDict::parse("x=2&y=3"),
///     json,
/// );
///
/// let merged = merge_sources(&request);
/// assert_eq!(merged["x"], FieldValue::from("1"));
/// assert_eq!(merged["y"], FieldValue::from("3"));
/// assert_eq!(merged["z"], FieldValue::Int(5));
/// assert!(!merged.contains_key("url"));
/// ```
pub fn merge_sources(request: &RequestData) -> IndexMap<String, FieldValue> {
    let mut merged = IndexMap::new();
    merge_dict(&mut merged, request.query());
    merge_dict(&mut merged, request.post());
    for (key, value) in request.json() {
        merged
            .entry(key.clone())
            .or_insert_with(|| FieldValue::from(value.clone()));
    }
    merged.shift_remove(RESERVED_URL_KEY);
    merged
}

fn merge_dict(merged: &mut IndexMap<String, FieldValue>, dict: &QueryDict) {
    for key in dict.keys() {
        if let Some(base) = key.strip_suffix("[]") {
            if merged.contains_key(base) {
                continue;
            }
            let items = dict
                .get_list(key)
                .map(|values| values.iter().map(|v| FieldValue::from(v.as_str())).collect())
                .unwrap_or_default();
            merged.insert(base.to_string(), FieldValue::List(items));
        } else if !merged.contains_key(key) {
            if let Some(value) = dict.get(key) {
                merged.insert(key.to_string(), FieldValue::from(value));
            }
        }
    }
}

/// Splits an image-button coordinate key (`name_x` / `name_y`, any case)
/// into its base name.
pub fn image_base(key: &str) -> Option<&str> {
    let split = key.len().checked_sub(2)?;
    let suffix = key.get(split..)?;
    if suffix.eq_ignore_ascii_case("_x") || suffix.eq_ignore_ascii_case("_y") {
        key.get(..split)
    } else {
        None
    }
}

impl FormSession {
    /// Binds request data onto the session's fields.
    ///
    /// Binding runs once per load: later calls are skipped until a load
    /// marks the session unbound, unless `force` is set. Returns whether a
    /// bind pass ran.
    pub fn bind(&mut self, request: &RequestData, force: bool) -> bool {
        if self.bound && !force {
            tracing::trace!("request already bound");
            return false;
        }

        let merged = merge_sources(request);
        let prefix = merged
            .get(PREFIX_KEY)
            .and_then(FieldValue::to_text)
            .unwrap_or_default();

        let mut coordinates: HashSet<String> = HashSet::new();
        for (key, value) in merged {
            if let Some(base) = image_base(&key) {
                let target = format!("{prefix}{base}");
                match self.fields.get_mut(&target) {
                    Some(field) => {
                        // first coordinate of this pass replaces what an earlier pass left
                        if coordinates.insert(target.clone()) {
                            field.set_value(FieldValue::List(Vec::new()));
                        }
                        field.push_value(value);
                    }
                    None => {
                        coordinates.insert(target.clone());
                        let field = BoundField::adhoc(&target, FieldValue::List(vec![value]));
                        self.fields.insert(target, field);
                    }
                }
            } else {
                self.assign(format!("{prefix}{key}"), value);
            }
        }

        self.bound = true;
        tracing::debug!(prefix = %prefix, fields = self.fields.len(), "bound request data");
        true
    }

    /// Binds the public properties of a serializable object.
    ///
    /// Each top-level member `k` is written to the field `prefix + k`, or to a
    /// new ad-hoc field. Image-button keys get no special treatment, and the
    /// bound flag is left alone.
    pub fn bind_object<T: Serialize + ?Sized>(
        &mut self,
        object: &T,
        prefix: &str,
    ) -> FormmapResult<()> {
        let serde_json::Value::Object(members) = serde_json::to_value(object)? else {
            return Err(FormmapError::SerializationError(
                "bound object must serialize to a map".to_string(),
            ));
        };
        for (key, value) in members {
            self.assign(format!("{prefix}{key}"), FieldValue::from(value));
        }
        Ok(())
    }

    fn assign(&mut self, key: String, value: FieldValue) {
        if let Some(field) = self.fields.get_mut(&key) {
            field.set_value(value);
        } else {
            let field = BoundField::adhoc(&key, value);
            self.fields.insert(key, field);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::schema::Schema;
    use crate::validation::ValidationContext;

    fn session(doc: &str) -> FormSession {
        let mut schema = Schema::new();
        schema.load_str("doc", doc).unwrap();
        FormSession::new(Arc::new(schema), ValidationContext::default())
    }

    fn query(qs: &str) -> RequestData {
        RequestData::new(QueryDict::parse(qs), QueryDict::new(), serde_json::Map::new())
    }

    const DOC: &str = r#"{"ns": {"f": {"class": "C", "fields": {
        "a": {"form_type": "text"},
        "b": {"form_type": "submit"}
    }}}}"#;

    #[test]
    fn test_image_base() {
        assert_eq!(image_base("go_x"), Some("go"));
        assert_eq!(image_base("go_Y"), Some("go"));
        assert_eq!(image_base("_x"), Some(""));
        assert_eq!(image_base("box"), None);
        assert_eq!(image_base("x"), None);
        assert_eq!(image_base("東_x"), Some("東"));
    }

    #[test]
    fn test_bind_image_coordinates() {
        let mut s = session(DOC);
        assert!(s.bind(&query("a=1&b_x=5&b_y=9"), false));
        assert_eq!(s.value("a"), Some(&FieldValue::from("1")));
        assert_eq!(
            s.value("b"),
            Some(&FieldValue::List(vec!["5".into(), "9".into()]))
        );
    }

    #[test]
    fn test_bind_image_adhoc() {
        let mut s = session(DOC);
        s.bind(&query("go_x=1&go_y=2"), false);
        assert_eq!(
            s.value("go"),
            Some(&FieldValue::List(vec!["1".into(), "2".into()]))
        );
    }

    #[test]
    fn test_force_rebind_does_not_double_coordinates() {
        let mut s = session(DOC);
        s.bind(&query("b_x=5&b_y=9"), false);
        s.bind(&query("b_x=6&b_y=7"), true);
        assert_eq!(
            s.value("b"),
            Some(&FieldValue::List(vec!["6".into(), "7".into()]))
        );
    }

    #[test]
    fn test_bind_runs_once_unless_forced() {
        let mut s = session(DOC);
        assert!(s.bind(&query("a=1"), false));
        assert!(!s.bind(&query("a=2"), false));
        assert_eq!(s.value("a"), Some(&FieldValue::from("1")));
        assert!(s.bind(&query("a=3"), true));
        assert_eq!(s.value("a"), Some(&FieldValue::from("3")));
    }

    #[test]
    fn test_bind_prefix_and_url() {
        let mut s = session(
            r#"{"ns": {"f": {"class": "C", "prefix": "p_", "fields": {"a": {"form_type": "text"}}}}}"#,
        );
        s.bind(&query("prefix=p_&a=7&url=/x"), false);
        assert_eq!(s.value("p_a"), Some(&FieldValue::from("7")));
        assert!(s.field("url").is_none());
        assert!(s.field("p_url").is_none());
    }

    #[test]
    fn test_bind_adhoc_field() {
        let mut s = session(DOC);
        s.bind(&query("unknown=v"), false);
        let field = s.field("unknown").unwrap();
        assert_eq!(field.value(), &FieldValue::from("v"));
        assert!(field.def().var_type.is_none());
    }

    #[test]
    fn test_merge_bracket_lists() {
        let merged = merge_sources(&query("tag[]=a&tag[]=b&tag=c"));
        assert_eq!(
            merged["tag"],
            FieldValue::List(vec!["a".into(), "b".into()])
        );
    }

    #[derive(Serialize)]
    struct Profile {
        a: String,
        extra: i64,
    }

    #[test]
    fn test_bind_object() {
        let mut s = session(DOC);
        s.bind_object(
            &Profile {
                a: "from object".into(),
                extra: 3,
            },
            "",
        )
        .unwrap();
        assert_eq!(s.value("a"), Some(&FieldValue::from("from object")));
        assert_eq!(s.value("extra"), Some(&FieldValue::Int(3)));
        assert!(!s.is_bound());
    }

    #[test]
    fn test_bind_object_rejects_non_map() {
        let mut s = session(DOC);
        assert!(matches!(
            s.bind_object(&vec![1, 2], ""),
            Err(FormmapError::SerializationError(_))
        ));
    }
}
