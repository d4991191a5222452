//! # formmap-forms
//!
//! The form-definition engine. Definition documents describe fields grouped
//! by namespace and form id; request data is bound onto those fields,
//! validated, and projected onto target objects through dotted property paths.
//!
//! ## Pipeline
//!
//! 1. [`Schema::load_str`](schema::Schema::load_str) / [`SchemaStore`] parse definitions once.
//! 2. [`FormSession::bind`](registry::FormSession::bind) writes request values per request.
//! 3. [`FormSession::validate_group`](registry::FormSession::validate_group) records failures.
//! 4. [`FormSession::generate`](registry::FormSession::generate) builds the target object.
//!
//! ## Modules
//!
//! - [`value`] - `FieldValue`, the bound value of a field
//! - [`fields`] - `FieldDef`, `FormType`, `VarType`, and the field factory
//! - [`bound_field`] - `BoundField`, a definition paired with its value
//! - [`filters`] - Named post-conversion value filters
//! - [`validation`] - The required / var-type / max / min check chain
//! - [`schema`] - Parsed definitions and their grouped indices
//! - [`registry`] - `SchemaStore` and per-request `FormSession`
//! - [`binder`] - Request-source merging and the binding algorithm
//! - [`generator`] - Object generation through property paths

pub mod binder;
pub mod bound_field;
pub mod fields;
pub mod filters;
pub mod generator;
pub mod registry;
pub mod schema;
pub mod validation;
pub mod value;

pub use bound_field::BoundField;
pub use fields::{FieldDef, FormType, VarType};
pub use filters::{FilterRegistry, ValueFilter};
pub use generator::{PathBinder, TargetObject};
pub use registry::{FormSession, SchemaStore};
pub use schema::{FormGroup, Schema, SchemaSource};
pub use validation::ValidationContext;
pub use value::FieldValue;
