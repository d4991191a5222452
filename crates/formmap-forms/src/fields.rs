//! Field definitions and the field factory.
//!
//! A [`FieldDef`] is the declared schema of one form input: its identity
//! (`prefix` + `id`), its classification ([`FormType`] x [`VarType`]), its
//! constraints, and where its value goes on a generated object. Field
//! definitions are immutable once loaded; runtime values live in
//! [`BoundField`](crate::bound_field::BoundField).
//!
//! [`generate`] is the factory: it turns a declarative [`FieldRecord`] from a
//! definition document into a `FieldDef`, rejecting unknown form and var types.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::Deserialize;

use formmap_core::{FormmapError, FormmapResult};

use crate::value::FieldValue;

/// The input-widget kind of a field.
///
/// Form types only matter for rendering, with one exception: text and
/// hidden inputs format a date-typed default for display
/// (see [`FieldDef::default_display`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormType {
    /// A generic element with no widget of its own. Ad-hoc fields use this.
    #[default]
    Element,
    /// `<input type="text">`.
    Text,
    /// `<input type="hidden">`.
    Hidden,
    /// `<input type="password">`.
    Password,
    /// `<select>`.
    Select,
    /// `<input type="submit">`.
    Submit,
    /// `<button>`.
    Button,
    /// `<textarea>`.
    Textarea,
    /// `<input type="search">`.
    Search,
}

impl FormType {
    /// Returns the name used in definition documents.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Element => "element",
            Self::Text => "text",
            Self::Hidden => "hidden",
            Self::Password => "password",
            Self::Select => "select",
            Self::Submit => "submit",
            Self::Button => "button",
            Self::Textarea => "textarea",
            Self::Search => "search",
        }
    }
}

impl FromStr for FormType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "element" | "generic" => Ok(Self::Element),
            "text" => Ok(Self::Text),
            "hidden" => Ok(Self::Hidden),
            "password" => Ok(Self::Password),
            "select" => Ok(Self::Select),
            "submit" => Ok(Self::Submit),
            "button" => Ok(Self::Button),
            "textarea" => Ok(Self::Textarea),
            "search" => Ok(Self::Search),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The semantic value kind of a field, governing conversion and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarType {
    /// A whole number.
    Int,
    /// A floating-point number.
    Float,
    /// Anything numeric; converted to a float.
    Numeric,
    /// Any string.
    String,
    /// ASCII letters.
    Alphabet,
    /// ASCII letters, digits, `_` and `.`.
    Alphanumeric,
    /// ASCII letters, digits and the marks `_ . % & # -`.
    AnMarks,
    /// A calendar date.
    Date,
    /// A time of day.
    Time,
    /// A date and time.
    DateTime,
    /// A boolean flag.
    Bool,
    /// An uploaded file.
    File,
    /// A telephone number (`telephone` or `tel`).
    Telephone,
    /// A year (1-9999).
    Year,
    /// A month (1-12).
    Month,
    /// A day of month (1-31).
    Day,
    /// An email address.
    Email,
}

impl VarType {
    /// Returns the name used in definition documents.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Numeric => "numeric",
            Self::String => "string",
            Self::Alphabet => "alphabet",
            Self::Alphanumeric => "alphanumeric",
            Self::AnMarks => "an_marks",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::Bool => "bool",
            Self::File => "file",
            Self::Telephone => "telephone",
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Email => "email",
        }
    }

    /// Var types whose max/min bounds compare numerically.
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Int | Self::Float | Self::Numeric | Self::Year | Self::Month | Self::Day
        )
    }

    /// Var types checked against a character class.
    pub const fn is_string_family(&self) -> bool {
        matches!(
            self,
            Self::String | Self::Alphabet | Self::Alphanumeric | Self::AnMarks | Self::Telephone
        )
    }
}

impl FromStr for VarType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "numeric" => Ok(Self::Numeric),
            "string" => Ok(Self::String),
            "alphabet" => Ok(Self::Alphabet),
            "alphanumeric" => Ok(Self::Alphanumeric),
            "an_marks" => Ok(Self::AnMarks),
            "date" => Ok(Self::Date),
            "time" => Ok(Self::Time),
            "datetime" => Ok(Self::DateTime),
            "bool" => Ok(Self::Bool),
            "file" => Ok(Self::File),
            "telephone" | "tel" => Ok(Self::Telephone),
            "year" => Ok(Self::Year),
            "month" => Ok(Self::Month),
            "day" => Ok(Self::Day),
            "email" => Ok(Self::Email),
            _ => Err(()),
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts either a single string or a list of strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// A single entry.
    One(String),
    /// Several entries.
    Many(Vec<String>),
}

impl Default for OneOrMany {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl From<OneOrMany> for Vec<String> {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(s) => vec![s],
            OneOrMany::Many(v) => v,
        }
    }
}

/// One field record as written in a definition document.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldRecord {
    /// The widget kind.
    #[serde(alias = "formType")]
    pub form_type: String,
    /// The value kind.
    #[serde(default, alias = "varType")]
    pub var_type: Option<String>,
    /// The display name used in messages.
    #[serde(default)]
    pub name: String,
    /// Whether a value must be present.
    #[serde(default)]
    pub required: bool,
    /// Inclusive upper bound (value or length).
    #[serde(default)]
    pub max: Option<f64>,
    /// Inclusive lower bound (value or length).
    #[serde(default)]
    pub min: Option<f64>,
    /// Exclusive upper bound (value or length).
    #[serde(default)]
    pub lesser: Option<f64>,
    /// Exclusive lower bound (value or length).
    #[serde(default)]
    pub greater: Option<f64>,
    /// Skip validation entirely when the value is absent.
    #[serde(default, alias = "validateNullSafe")]
    pub validate_null_safe: bool,
    /// Dotted property path on the generated object.
    #[serde(default)]
    pub property: Option<String>,
    /// Filter names applied after conversion, in order.
    #[serde(default)]
    pub filters: Option<OneOrMany>,
    /// Rendering fallback value.
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    /// Initial bound value.
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    /// Select options (value -> label).
    #[serde(default)]
    pub options: IndexMap<String, serde_json::Value>,
    /// Inline style declarations.
    #[serde(default)]
    pub style: Option<OneOrMany>,
    /// CSS class.
    #[serde(default)]
    pub class: Option<String>,
    /// Placeholder text.
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Input size.
    #[serde(default)]
    pub size: Option<u32>,
    /// Access key.
    #[serde(default)]
    pub accesskey: Option<String>,
    /// Image source for image buttons.
    #[serde(default)]
    pub src: Option<String>,
    /// Whether rendered values are HTML-escaped.
    #[serde(default = "default_escape")]
    pub escape: bool,
}

const fn default_escape() -> bool {
    true
}

/// The declared schema of one form field.
///
/// # Examples
///
/// ```
/// use formmap_forms::fields::{FieldDef, FormType, VarType};
///
/// let field = FieldDef::new("age", FormType::Text)
///     .prefix("user_")
///     .var_type(VarType::Int)
///     .required(true)
///     .max(150.0)
///     .property("profile.age");
/// assert_eq!(field.key(), "user_age");
/// assert_eq!(field.label(), "age");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// The declared id.
    pub id: String,
    /// Namespace-scoping prefix prepended to the id.
    pub prefix: String,
    /// The widget kind.
    pub form_type: FormType,
    /// The value kind; `None` for untyped fields.
    pub var_type: Option<VarType>,
    /// Display name used in messages.
    pub name: String,
    /// Whether a value must be present.
    pub required: bool,
    /// Inclusive upper bound.
    pub max: Option<f64>,
    /// Inclusive lower bound.
    pub min: Option<f64>,
    /// Exclusive upper bound.
    pub lesser: Option<f64>,
    /// Exclusive lower bound.
    pub greater: Option<f64>,
    /// Skip validation entirely when the value is absent.
    pub validate_null_safe: bool,
    /// Dotted property path; `None` excludes the field from object generation.
    pub property: Option<String>,
    /// Filter names applied after conversion, in order.
    pub filters: Vec<String>,
    /// Rendering fallback; never used for binding or validation.
    pub default: FieldValue,
    /// Value a fresh session starts with.
    pub initial: FieldValue,
    /// Select options (value -> label).
    pub options: IndexMap<String, String>,
    /// Inline style declarations.
    pub style: Vec<String>,
    /// CSS class.
    pub class: Option<String>,
    /// Placeholder text.
    pub placeholder: Option<String>,
    /// Input size.
    pub size: Option<u32>,
    /// Access key.
    pub accesskey: Option<String>,
    /// Image source for image buttons.
    pub src: Option<String>,
    /// Whether rendered values are HTML-escaped.
    pub escape: bool,
}

impl FieldDef {
    /// Creates a field with no constraints.
    pub fn new(id: impl Into<String>, form_type: FormType) -> Self {
        Self {
            id: id.into(),
            prefix: String::new(),
            form_type,
            var_type: None,
            name: String::new(),
            required: false,
            max: None,
            min: None,
            lesser: None,
            greater: None,
            validate_null_safe: false,
            property: None,
            filters: Vec::new(),
            default: FieldValue::Null,
            initial: FieldValue::Null,
            options: IndexMap::new(),
            style: Vec::new(),
            class: None,
            placeholder: None,
            size: None,
            accesskey: None,
            src: None,
            escape: true,
        }
    }

    /// Creates the untyped, id-only field the binder uses for unknown keys.
    pub fn adhoc(key: impl Into<String>) -> Self {
        Self::new(key, FormType::Element)
    }

    /// Sets the prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the var type.
    #[must_use]
    pub const fn var_type(mut self, var_type: VarType) -> Self {
        self.var_type = Some(var_type);
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets whether a value is required.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the inclusive upper bound.
    #[must_use]
    pub const fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Sets the inclusive lower bound.
    #[must_use]
    pub const fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Sets the exclusive upper bound.
    #[must_use]
    pub const fn lesser(mut self, lesser: f64) -> Self {
        self.lesser = Some(lesser);
        self
    }

    /// Sets the exclusive lower bound.
    #[must_use]
    pub const fn greater(mut self, greater: f64) -> Self {
        self.greater = Some(greater);
        self
    }

    /// Sets whether validation is skipped for absent values.
    #[must_use]
    pub const fn validate_null_safe(mut self, null_safe: bool) -> Self {
        self.validate_null_safe = null_safe;
        self
    }

    /// Sets the property path.
    #[must_use]
    pub fn property(mut self, path: impl Into<String>) -> Self {
        self.property = Some(path.into());
        self
    }

    /// Appends a filter.
    #[must_use]
    pub fn filter(mut self, name: impl Into<String>) -> Self {
        self.filters.push(name.into());
        self
    }

    /// Sets the rendering default.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = value.into();
        self
    }

    /// Sets the initial bound value.
    #[must_use]
    pub fn initial(mut self, value: impl Into<FieldValue>) -> Self {
        self.initial = value.into();
        self
    }

    /// The composite key: `prefix + id`.
    pub fn key(&self) -> String {
        format!("{}{}", self.prefix, self.id)
    }

    /// The name shown in messages; falls back to the id.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// The default as displayed in a rendered input.
    ///
    /// Text and hidden inputs typed `date` or `datetime` normalize their
    /// default to `Y-m-d` / `Y-m-d H:M:S`; `now` and `today` resolve to the
    /// current local time. Other fields display the default as-is.
    pub fn default_display(&self) -> Option<String> {
        let raw = self.default.to_text().filter(|s| !s.is_empty())?;

        if !matches!(self.form_type, FormType::Text | FormType::Hidden) {
            return Some(raw);
        }

        let formatted = match self.var_type {
            Some(VarType::DateTime) => {
                parse_datetime(&raw).map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            }
            Some(VarType::Date) => {
                parse_datetime(&raw).map(|dt| dt.format("%Y-%m-%d").to_string())
            }
            _ => None,
        };
        Some(formatted.unwrap_or(raw))
    }
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Parses the date/datetime spellings accepted in definition defaults.
fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    match raw.to_ascii_lowercase().as_str() {
        "now" => return Some(Local::now().naive_local()),
        "today" => return Local::now().date_naive().and_hms_opt(0, 0, 0),
        _ => {}
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Builds a [`FieldDef`] from a definition record.
///
/// Dispatches on the record's form type; an unknown form type or var type
/// is a configuration error, never a silently dropped field.
pub fn generate(id: &str, prefix: &str, record: FieldRecord) -> FormmapResult<FieldDef> {
    let key = format!("{prefix}{id}");

    let form_type: FormType =
        record
            .form_type
            .parse()
            .map_err(|()| FormmapError::UnknownFormType {
                field: key.clone(),
                form_type: record.form_type.clone(),
            })?;

    let var_type = match record.var_type.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<VarType>().map_err(|()| {
            FormmapError::UnknownVarType {
                field: key.clone(),
                var_type: raw.to_string(),
            }
        })?),
    };

    let options = record
        .options
        .into_iter()
        .map(|(value, label)| {
            let label = match label {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (value, label)
        })
        .collect();

    Ok(FieldDef {
        id: id.to_string(),
        prefix: prefix.to_string(),
        form_type,
        var_type,
        name: record.name,
        required: record.required,
        max: record.max,
        min: record.min,
        lesser: record.lesser,
        greater: record.greater,
        validate_null_safe: record.validate_null_safe,
        property: record.property.filter(|p| !p.is_empty()),
        filters: record
            .filters
            .map(Vec::from)
            .unwrap_or_default()
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect(),
        default: record.default.map(FieldValue::from).unwrap_or_default(),
        initial: record.value.map(FieldValue::from).unwrap_or_default(),
        options,
        style: record.style.map(Vec::from).unwrap_or_default(),
        class: record.class,
        placeholder: record.placeholder,
        size: record.size,
        accesskey: record.accesskey,
        src: record.src,
        escape: record.escape,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: serde_json::Value) -> FieldRecord {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_form_type_parse() {
        assert_eq!("text".parse::<FormType>(), Ok(FormType::Text));
        assert_eq!("generic".parse::<FormType>(), Ok(FormType::Element));
        assert_eq!("element".parse::<FormType>(), Ok(FormType::Element));
        assert!("radio".parse::<FormType>().is_err());
        assert_eq!(FormType::Password.to_string(), "password");
    }

    #[test]
    fn test_var_type_parse_and_families() {
        assert_eq!("tel".parse::<VarType>(), Ok(VarType::Telephone));
        assert_eq!("an_marks".parse::<VarType>(), Ok(VarType::AnMarks));
        assert!("uuid".parse::<VarType>().is_err());
        assert!(VarType::Year.is_numeric());
        assert!(!VarType::String.is_numeric());
        assert!(VarType::Alphanumeric.is_string_family());
        assert!(!VarType::Email.is_string_family());
    }

    #[test]
    fn test_generate_full_record() {
        let rec = record(serde_json::json!({
            "form_type": "text",
            "var_type": "int",
            "name": "Age",
            "required": true,
            "min": 0,
            "max": 150,
            "property": "profile.age",
            "filters": "like",
            "options": {"1": "One", "2": 2}
        }));
        let field = generate("age", "user_", rec).unwrap();
        assert_eq!(field.key(), "user_age");
        assert_eq!(field.form_type, FormType::Text);
        assert_eq!(field.var_type, Some(VarType::Int));
        assert_eq!(field.label(), "Age");
        assert_eq!(field.max, Some(150.0));
        assert_eq!(field.filters, vec!["like".to_string()]);
        assert_eq!(field.options.get("2").map(String::as_str), Some("2"));
        assert_eq!(field.property.as_deref(), Some("profile.age"));
    }

    #[test]
    fn test_generate_camel_case_aliases() {
        let rec = record(serde_json::json!({
            "formType": "hidden",
            "varType": "string",
            "validateNullSafe": true
        }));
        let field = generate("token", "", rec).unwrap();
        assert_eq!(field.form_type, FormType::Hidden);
        assert!(field.validate_null_safe);
        assert!(field.escape);
    }

    #[test]
    fn test_generate_unknown_form_type() {
        let rec = record(serde_json::json!({"form_type": "radio"}));
        let err = generate("kind", "p_", rec).unwrap_err();
        assert!(matches!(
            err,
            FormmapError::UnknownFormType { ref field, ref form_type }
                if field == "p_kind" && form_type == "radio"
        ));
    }

    #[test]
    fn test_generate_unknown_var_type() {
        let rec = record(serde_json::json!({"form_type": "text", "var_type": "uuid"}));
        assert!(matches!(
            generate("x", "", rec),
            Err(FormmapError::UnknownVarType { .. })
        ));
    }

    #[test]
    fn test_generate_empty_property_is_excluded() {
        let rec = record(serde_json::json!({"form_type": "submit", "property": ""}));
        assert!(generate("go", "", rec).unwrap().property.is_none());
    }

    #[test]
    fn test_default_display_formats_dates_for_text_and_hidden() {
        let text = FieldDef::new("d", FormType::Text)
            .var_type(VarType::Date)
            .default_value("2020/03/04 10:11:12");
        assert_eq!(text.default_display().as_deref(), Some("2020-03-04"));

        let hidden = FieldDef::new("d", FormType::Hidden)
            .var_type(VarType::DateTime)
            .default_value("2020-03-04");
        assert_eq!(
            hidden.default_display().as_deref(),
            Some("2020-03-04 00:00:00")
        );

        let select = FieldDef::new("d", FormType::Select)
            .var_type(VarType::Date)
            .default_value("2020/03/04");
        assert_eq!(select.default_display().as_deref(), Some("2020/03/04"));
    }

    #[test]
    fn test_default_display_empty_and_unparseable() {
        let field = FieldDef::new("d", FormType::Text).var_type(VarType::Date);
        assert_eq!(field.default_display(), None);

        let field = field.default_value("someday");
        assert_eq!(field.default_display().as_deref(), Some("someday"));
    }

    #[test]
    fn test_default_display_today() {
        let field = FieldDef::new("d", FormType::Text)
            .var_type(VarType::Date)
            .default_value("today");
        let expected = Local::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(field.default_display(), Some(expected));
    }
}
