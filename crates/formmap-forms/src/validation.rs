//! The per-field validation chain.
//!
//! Every field runs four checks in a fixed order: required, var type, max,
//! min. Each check returns a [`ValidationError`] on failure; [`validate_field`]
//! records one message per failing check in the session's
//! [`MessageStorage`] and reports at most one failure for the field, so a
//! group's failure count is the number of invalid fields.
//!
//! Var-type, max and min checks only look at present, non-empty values. An
//! empty value is the required check's business alone.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use formmap_core::{MessageStorage, Settings, ValidationError, MESSAGE_TAG};

use crate::bound_field::BoundField;
use crate::fields::{FieldDef, VarType};
use crate::value::FieldValue;

/// Settings that govern a validation pass.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Match string var types against the whole value instead of its first character.
    pub strict_charset: bool,
    /// Skip every absent field, regardless of its own null-safe flag.
    pub null_safe: bool,
    /// Tag attached to recorded messages.
    pub tag: String,
}

impl ValidationContext {
    /// Builds a context from engine settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            strict_charset: settings.strict_charset,
            null_safe: settings.validate_null_safe,
            tag: settings.message_tag.clone(),
        }
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self {
            strict_charset: true,
            null_safe: false,
            tag: MESSAGE_TAG.to_string(),
        }
    }
}

/// Validates one field and records each failing check in `sink`.
///
/// Returns 1 if any check failed, 0 otherwise.
pub fn validate_field(
    def: &FieldDef,
    value: &FieldValue,
    ctx: &ValidationContext,
    sink: &mut MessageStorage,
) -> u32 {
    if value.is_null() && (def.validate_null_safe || ctx.null_safe) {
        return 0;
    }

    let key = def.key();
    let checks = [
        check_required(def, value),
        check_var_type(def, value, ctx.strict_charset),
        check_max(def, value),
        check_min(def, value),
    ];

    let mut failed = false;
    for err in checks.into_iter().filter_map(Result::err) {
        tracing::debug!(field = %key, code = %err.code, "validation failed");
        sink.add_error(&key, &err.message, &ctx.tag);
        failed = true;
    }
    u32::from(failed)
}

/// Validates every field and returns the number of invalid fields.
pub fn validate_group<'a>(
    fields: impl IntoIterator<Item = &'a BoundField>,
    ctx: &ValidationContext,
    sink: &mut MessageStorage,
) -> u32 {
    fields
        .into_iter()
        .map(|field| field.validate(ctx, sink))
        .sum()
}

fn failure(def: &FieldDef, code: &str, message: String) -> ValidationError {
    ValidationError::new(message, code).with_param("field", def.key())
}

/// Fails when a required field holds nothing, an empty string, or an empty list.
pub fn check_required(def: &FieldDef, value: &FieldValue) -> Result<(), ValidationError> {
    if def.required && value.is_empty() {
        return Err(failure(
            def,
            "required",
            format!("「{}」 is required.", def.label()),
        ));
    }
    Ok(())
}

/// Checks the value against the field's var type. List values are checked item by item.
pub fn check_var_type(
    def: &FieldDef,
    value: &FieldValue,
    strict_charset: bool,
) -> Result<(), ValidationError> {
    let Some(var_type) = def.var_type else {
        return Ok(());
    };
    if value.is_empty() {
        return Ok(());
    }
    if let FieldValue::List(items) = value {
        return items
            .iter()
            .filter(|item| !item.is_empty())
            .try_for_each(|item| check_scalar_type(def, var_type, item, strict_charset));
    }
    check_scalar_type(def, var_type, value, strict_charset)
}

fn check_scalar_type(
    def: &FieldDef,
    var_type: VarType,
    value: &FieldValue,
    strict_charset: bool,
) -> Result<(), ValidationError> {
    let label = def.label();
    let fail = |message: String| Err(failure(def, "var_type", message));

    match var_type {
        VarType::Int => match value {
            FieldValue::Int(i) if *i == i64::MIN || *i == i64::MAX => {
                fail(format!("「{label}」 is out of the integer range."))
            }
            FieldValue::Int(_) => Ok(()),
            _ => match value.to_text().as_deref().map(parse_int) {
                Some(IntCheck::Ok) => Ok(()),
                Some(IntCheck::TooLarge) => {
                    fail(format!("「{label}」 must be less than {}.", i64::MAX))
                }
                Some(IntCheck::TooSmall) => {
                    fail(format!("「{label}」 must be greater than {}.", i64::MIN))
                }
                Some(IntCheck::NotInt) | None => fail(format!("「{label}」 must be an integer.")),
            },
        },
        VarType::Float => {
            if as_number(value).is_some() {
                Ok(())
            } else {
                fail(format!("「{label}」 must be a decimal number."))
            }
        }
        VarType::Numeric => {
            if as_number(value).is_some() {
                Ok(())
            } else {
                fail(format!("「{label}」 must be a number."))
            }
        }
        VarType::String => {
            if value.to_text().is_some() {
                Ok(())
            } else {
                fail(format!("「{label}」 must be a string."))
            }
        }
        VarType::Alphabet => charset(value, ALPHABET, strict_charset)
            .then_some(())
            .ok_or_else(|| {
                failure(def, "var_type", format!("「{label}」 must contain only letters."))
            }),
        VarType::Alphanumeric => charset(value, ALPHANUMERIC, strict_charset)
            .then_some(())
            .ok_or_else(|| {
                failure(
                    def,
                    "var_type",
                    format!("「{label}」 must contain only letters, digits, '_' and '.'."),
                )
            }),
        VarType::AnMarks => charset(value, AN_MARKS, strict_charset)
            .then_some(())
            .ok_or_else(|| {
                failure(
                    def,
                    "var_type",
                    format!("「{label}」 must contain only letters, digits and the marks _ . % & # -."),
                )
            }),
        VarType::Telephone => {
            if text_matches(value, telephone_re()) {
                Ok(())
            } else {
                fail(format!("「{label}」 must be a telephone number."))
            }
        }
        VarType::Email => {
            if text_matches(value, email_re()) {
                Ok(())
            } else {
                fail(format!("「{label}」 must be an email address."))
            }
        }
        VarType::Date => {
            if value.to_text().as_deref().and_then(parse_date).is_some() {
                Ok(())
            } else {
                fail(format!("「{label}」 must be a date (YYYY-MM-DD)."))
            }
        }
        VarType::Time => {
            if value.to_text().as_deref().and_then(parse_time).is_some() {
                Ok(())
            } else {
                fail(format!("「{label}」 must be a time (HH:MM or HH:MM:SS)."))
            }
        }
        VarType::DateTime => {
            if value.to_text().as_deref().and_then(parse_datetime).is_some() {
                Ok(())
            } else {
                fail(format!("「{label}」 must be a date and time."))
            }
        }
        VarType::Bool => {
            if matches!(value, FieldValue::Bool(_))
                || value.to_text().as_deref().and_then(parse_bool).is_some()
            {
                Ok(())
            } else {
                fail(format!("「{label}」 must be a yes/no value."))
            }
        }
        VarType::Year => in_range(def, value, 1, 9999, "a year"),
        VarType::Month => in_range(def, value, 1, 12, "a month"),
        VarType::Day => in_range(def, value, 1, 31, "a day of the month"),
        VarType::File => Ok(()),
    }
}

fn in_range(
    def: &FieldDef,
    value: &FieldValue,
    lo: i64,
    hi: i64,
    what: &str,
) -> Result<(), ValidationError> {
    let n = match value {
        FieldValue::Int(i) => Some(*i),
        _ => value
            .to_text()
            .filter(|t| int_re().is_match(t))
            .and_then(|t| t.parse::<i64>().ok()),
    };
    match n {
        Some(n) if (lo..=hi).contains(&n) => Ok(()),
        _ => Err(failure(
            def,
            "var_type",
            format!("「{}」 must be {what} between {lo} and {hi}.", def.label()),
        )),
    }
}

/// Inclusive upper bound, plus the exclusive `lesser` bound.
pub fn check_max(def: &FieldDef, value: &FieldValue) -> Result<(), ValidationError> {
    if def.max.is_none() && def.lesser.is_none() {
        return Ok(());
    }
    let Some((measure, unit)) = measure(def, value) else {
        return Ok(());
    };

    if let Some(max) = def.max {
        if measure > max {
            return Err(failure(def, "max", bound_message(def, unit, "at most", max))
                .with_param("limit", max.to_string()));
        }
    }
    if let Some(lesser) = def.lesser {
        if measure >= lesser {
            return Err(
                failure(def, "max", bound_message(def, unit, "less than", lesser))
                    .with_param("limit", lesser.to_string()),
            );
        }
    }
    Ok(())
}

/// Inclusive lower bound, plus the exclusive `greater` bound.
pub fn check_min(def: &FieldDef, value: &FieldValue) -> Result<(), ValidationError> {
    if def.min.is_none() && def.greater.is_none() {
        return Ok(());
    }
    let Some((measure, unit)) = measure(def, value) else {
        return Ok(());
    };

    if let Some(min) = def.min {
        if measure < min {
            return Err(failure(def, "min", bound_message(def, unit, "at least", min))
                .with_param("limit", min.to_string()));
        }
    }
    if let Some(greater) = def.greater {
        if measure <= greater {
            return Err(
                failure(def, "min", bound_message(def, unit, "greater than", greater))
                    .with_param("limit", greater.to_string()),
            );
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Value,
    Chars,
    Items,
}

fn bound_message(def: &FieldDef, unit: Unit, relation: &str, limit: f64) -> String {
    let label = def.label();
    match unit {
        Unit::Value => format!("「{label}」 must be {relation} {limit}."),
        Unit::Chars => format!("「{label}」 must be {relation} {limit} characters long."),
        Unit::Items => format!("「{label}」 must have {relation} {limit} items."),
    }
}

/// The quantity bounds compare against: item count for lists, the number
/// itself for numeric var types, character length otherwise.
#[allow(clippy::cast_precision_loss)]
fn measure(def: &FieldDef, value: &FieldValue) -> Option<(f64, Unit)> {
    if value.is_empty() {
        return None;
    }
    match value {
        FieldValue::List(items) => Some((items.len() as f64, Unit::Items)),
        FieldValue::Json(_) => None,
        _ if def.var_type.is_some_and(|t| t.is_numeric()) => {
            as_number(value).map(|n| (n, Unit::Value))
        }
        _ => value
            .to_text()
            .map(|t| (t.chars().count() as f64, Unit::Chars)),
    }
}

// ============================================================
// Parsing helpers
// ============================================================

enum IntCheck {
    Ok,
    NotInt,
    TooLarge,
    TooSmall,
}

/// `-?[0-9]+`, strictly inside the i64 range. Surrounding whitespace is
/// ignored, as it is by conversion.
fn parse_int(text: &str) -> IntCheck {
    let text = text.trim();
    if !int_re().is_match(text) {
        return IntCheck::NotInt;
    }
    let negative = text.starts_with('-');
    let digits = text.trim_start_matches('-').trim_start_matches('0');
    if digits.len() > 19 {
        return if negative {
            IntCheck::TooSmall
        } else {
            IntCheck::TooLarge
        };
    }
    match text.parse::<i128>() {
        Ok(v) if v >= i128::from(i64::MAX) => IntCheck::TooLarge,
        Ok(v) if v <= i128::from(i64::MIN) => IntCheck::TooSmall,
        Ok(_) => IntCheck::Ok,
        Err(_) => IntCheck::NotInt,
    }
}

/// Returns the numeric value of an int, float, or decimal text.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn as_number(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Int(i) => Some(*i as f64),
        FieldValue::Float(f) if f.is_finite() => Some(*f),
        FieldValue::String(s) if decimal_re().is_match(s.trim()) => {
            s.trim().parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    ["%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
    ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

fn text_matches(value: &FieldValue, re: &Regex) -> bool {
    value.to_text().is_some_and(|t| re.is_match(&t))
}

const ALPHABET: &str = "a-zA-Z";
const ALPHANUMERIC: &str = "a-zA-Z0-9_.";
const AN_MARKS: &str = "a-zA-Z0-9_.%&#-";

/// Matches the value against a character class, either the whole value or
/// (legacy) its first character only.
fn charset(value: &FieldValue, class: &'static str, strict: bool) -> bool {
    static TABLE: OnceLock<HashMap<(&'static str, bool), Regex>> = OnceLock::new();
    let table = TABLE.get_or_init(|| {
        [ALPHABET, ALPHANUMERIC, AN_MARKS]
            .into_iter()
            .flat_map(|class| {
                [
                    ((class, true), format!("^[{class}]+$")),
                    ((class, false), format!("^[{class}]")),
                ]
            })
            .map(|(k, pattern)| (k, Regex::new(&pattern).expect("valid regex")))
            .collect()
    });

    value
        .to_text()
        .is_some_and(|text| table.get(&(class, strict)).is_some_and(|re| re.is_match(&text)))
}

fn int_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?[0-9]+$").expect("valid regex"))
}

fn decimal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?$").expect("valid regex")
    })
}

fn telephone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9+\-() ]*[0-9][0-9+\-() ]*$").expect("valid regex"))
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").expect("valid regex"))
}
