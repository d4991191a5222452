//! A field definition paired with its per-request value.

use std::sync::Arc;

use formmap_core::{FormmapResult, MessageStorage};

use crate::fields::{FieldDef, VarType};
use crate::filters::FilterRegistry;
use crate::validation::{self, ValidationContext};
use crate::value::FieldValue;

/// A field bound to a value for the duration of one request.
///
/// The definition is shared with the schema; only the value belongs to the
/// session.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use formmap_forms::{BoundField, FieldDef, FieldValue, FormType, VarType};
///
/// let def = Arc::new(FieldDef::new("age", FormType::Text).var_type(VarType::Int));
/// let mut field = BoundField::new(def);
/// field.set_value("42");
/// field.convert();
/// assert_eq!(field.value(), &FieldValue::Int(42));
/// ```
#[derive(Debug, Clone)]
pub struct BoundField {
    def: Arc<FieldDef>,
    value: FieldValue,
}

impl BoundField {
    /// Binds a definition to its declared initial value.
    pub fn new(def: Arc<FieldDef>) -> Self {
        let value = def.initial.clone();
        Self { def, value }
    }

    /// Creates an untyped field for a key the schema does not declare.
    pub fn adhoc(key: &str, value: FieldValue) -> Self {
        Self {
            def: Arc::new(FieldDef::adhoc(key)),
            value,
        }
    }

    /// The field definition.
    pub fn def(&self) -> &FieldDef {
        &self.def
    }

    pub(crate) const fn def_arc(&self) -> &Arc<FieldDef> {
        &self.def
    }

    /// The composite key (`prefix + id`).
    pub fn key(&self) -> String {
        self.def.key()
    }

    /// The bound value.
    pub const fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Replaces the bound value.
    pub fn set_value(&mut self, value: impl Into<FieldValue>) {
        self.value = value.into();
    }

    /// Appends to a list value. A value that is not a list is replaced by an
    /// empty list first.
    pub fn push_value(&mut self, value: impl Into<FieldValue>) {
        let value = value.into();
        if let FieldValue::List(items) = &mut self.value {
            items.push(value);
        } else {
            self.value = FieldValue::List(vec![value]);
        }
    }

    /// Coerces the value in place according to the var type.
    ///
    /// A value that cannot be coerced is left as it is.
    pub fn convert(&mut self) {
        self.value = self.converted();
    }

    /// Returns the value coerced according to the var type, without mutating.
    pub fn converted(&self) -> FieldValue {
        let Some(var_type) = self.def.var_type else {
            return self.value.clone();
        };
        match &self.value {
            FieldValue::List(items) => FieldValue::List(
                items
                    .iter()
                    .map(|item| self.coerce(var_type, item))
                    .collect(),
            ),
            value => self.coerce(var_type, value),
        }
    }

    fn coerce(&self, var_type: VarType, value: &FieldValue) -> FieldValue {
        if value.is_null() {
            return FieldValue::Null;
        }
        let coerced = match var_type {
            VarType::Int => to_int(value),
            VarType::Float | VarType::Numeric => to_float(value),
            VarType::Bool => to_bool(value),
            _ => return value.clone(),
        };
        coerced.unwrap_or_else(|| {
            tracing::debug!(
                field = %self.def.key(),
                var_type = %var_type,
                value = %value,
                "value left unconverted"
            );
            value.clone()
        })
    }

    /// Applies the field's filter chain to the current value.
    pub fn filter(&self, filters: &FilterRegistry) -> FormmapResult<FieldValue> {
        filters.apply_chain(&self.def.filters, self.value.clone())
    }

    /// The value written to a generated object: converted, then filtered.
    ///
    /// The bound value is not modified.
    pub fn project(&self, filters: &FilterRegistry) -> FormmapResult<FieldValue> {
        filters.apply_chain(&self.def.filters, self.converted())
    }

    /// Runs the validation chain; returns 1 on failure, 0 otherwise.
    pub fn validate(&self, ctx: &ValidationContext, sink: &mut MessageStorage) -> u32 {
        validation::validate_field(&self.def, &self.value, ctx, sink)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn to_int(value: &FieldValue) -> Option<FieldValue> {
    match value {
        FieldValue::Int(_) => Some(value.clone()),
        FieldValue::Bool(b) => Some(FieldValue::Int(i64::from(*b))),
        FieldValue::Float(f) if f.is_finite() && f.abs() < i64::MAX as f64 => {
            Some(FieldValue::Int(f.trunc() as i64))
        }
        FieldValue::String(s) => s.trim().parse::<i64>().ok().map(FieldValue::Int),
        _ => None,
    }
}

fn to_float(value: &FieldValue) -> Option<FieldValue> {
    match value {
        FieldValue::Bool(b) => Some(FieldValue::Float(if *b { 1.0 } else { 0.0 })),
        _ => validation::as_number(value).map(FieldValue::Float),
    }
}

fn to_bool(value: &FieldValue) -> Option<FieldValue> {
    match value {
        FieldValue::Bool(_) => Some(value.clone()),
        FieldValue::Int(i) => Some(FieldValue::Bool(*i != 0)),
        FieldValue::Float(f) => Some(FieldValue::Bool(*f != 0.0)),
        FieldValue::String(s) => validation::parse_bool(s).map(FieldValue::Bool),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FormType;

    fn bound(def: FieldDef, value: impl Into<FieldValue>) -> BoundField {
        let mut field = BoundField::new(Arc::new(def));
        field.set_value(value);
        field
    }

    #[test]
    fn test_new_uses_initial_value() {
        let def = FieldDef::new("page", FormType::Hidden).initial("1");
        let field = BoundField::new(Arc::new(def));
        assert_eq!(field.value(), &FieldValue::from("1"));
        assert_eq!(field.key(), "page");
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn test_convert_float() {
        let mut field = bound(
            FieldDef::new("price", FormType::Text).var_type(VarType::Float),
            "3.14",
        );
        field.convert();
        assert_eq!(field.value(), &FieldValue::Float(3.14));
    }

    #[test]
    fn test_convert_failure_keeps_value() {
        let mut field = bound(
            FieldDef::new("n", FormType::Text).var_type(VarType::Int),
            "12a",
        );
        field.convert();
        assert_eq!(field.value(), &FieldValue::from("12a"));
    }

    #[test]
    fn test_convert_int_agrees_with_validation() {
        let ctx = ValidationContext::default();
        let mut sink = MessageStorage::new();
        let mut field = bound(
            FieldDef::new("n", FormType::Text).var_type(VarType::Int),
            " 12",
        );
        assert_eq!(field.validate(&ctx, &mut sink), 0);
        field.convert();
        assert_eq!(field.value(), &FieldValue::Int(12));
    }

    #[test]
    fn test_convert_null_is_noop() {
        let mut field = BoundField::new(Arc::new(
            FieldDef::new("n", FormType::Text).var_type(VarType::Int),
        ));
        field.convert();
        assert!(field.value().is_null());
    }

    #[test]
    fn test_convert_bool_and_untyped() {
        let mut flag = bound(
            FieldDef::new("agree", FormType::Text).var_type(VarType::Bool),
            "on",
        );
        flag.convert();
        assert_eq!(flag.value(), &FieldValue::Bool(true));

        let mut text = bound(FieldDef::new("q", FormType::Search), "007");
        text.convert();
        assert_eq!(text.value(), &FieldValue::from("007"));
    }

    #[test]
    fn test_convert_list_items() {
        let field = bound(
            FieldDef::new("b", FormType::Submit).var_type(VarType::Int),
            vec![FieldValue::from("5"), FieldValue::from("x")],
        );
        assert_eq!(
            field.converted(),
            FieldValue::List(vec![FieldValue::Int(5), FieldValue::from("x")])
        );
    }

    #[test]
    fn test_push_value() {
        let mut field = BoundField::adhoc("b", FieldValue::Null);
        field.push_value("5");
        field.push_value("9");
        assert_eq!(
            field.value(),
            &FieldValue::List(vec!["5".into(), "9".into()])
        );

        let mut scalar = BoundField::adhoc("c", FieldValue::from("1"));
        scalar.push_value("2");
        assert_eq!(scalar.value(), &FieldValue::List(vec!["2".into()]));
    }

    #[test]
    fn test_project_is_pure() {
        let filters = FilterRegistry::with_builtins(4);
        let field = bound(
            FieldDef::new("q", FormType::Search)
                .var_type(VarType::Int)
                .filter("like"),
            "12",
        );
        assert_eq!(field.project(&filters).unwrap(), FieldValue::from("%12%"));
        assert_eq!(field.value(), &FieldValue::from("12"));
    }

    #[test]
    fn test_filter_empty_string_untouched() {
        let filters = FilterRegistry::with_builtins(4);
        let field = bound(FieldDef::new("q", FormType::Search).filter("like"), "");
        assert_eq!(field.filter(&filters).unwrap(), FieldValue::from(""));
    }

    #[test]
    fn test_validate_counts_once() {
        let field = bound(
            FieldDef::new("n", FormType::Text).var_type(VarType::Int).max(3.0),
            "12a",
        );
        let mut sink = MessageStorage::new();
        assert_eq!(field.validate(&ValidationContext::default(), &mut sink), 1);
        assert_eq!(sink.len(), 1);
    }
}
