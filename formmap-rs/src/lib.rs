//! # formmap-rs
//!
//! A declarative form-definition engine.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `formmap-rs` to get the whole engine, or depend on
//! individual crates for finer-grained control.
//!
//! ```
//! use formmap_rs::prelude::*;
//!
//! let store = SchemaStore::new(Settings::default());
//! store
//!     .load(&SchemaSource::json(
//!         "login.json",
//!         r#"{"user": {"login": {"class": "Credentials", "fields": {
//!             "id": {"form_type": "text", "var_type": "alphanumeric",
//!                    "required": true, "property": "id"}
//!         }}}}"#,
//!     ))
//!     .unwrap();
//!
//! let mut session = store.session();
//! session.bind(&RequestData::new(QueryDict::parse("id=alice"), QueryDict::new(), Default::default()), false);
//! assert_eq!(session.validate_group("user", "login").unwrap(), 0);
//!
//! let object = session.generate("user", "login").unwrap();
//! assert_eq!(object.get_path("id"), Some(&serde_json::json!("alice")));
//! ```

/// Core types, settings, messages, and error types.
pub use formmap_core as core;

/// Request data: `QueryDict` and the three parameter sources.
pub use formmap_http as http;

/// Schemas, binding, validation, filters, and object generation.
pub use formmap_forms as forms;

/// Command-line tooling.
#[cfg(feature = "cli")]
pub use formmap_cli as cli;

// Third-party re-exports
pub use serde;
pub use serde_json;
pub use tracing;
pub use tracing_subscriber;

/// Commonly used types, importable with `use formmap_rs::prelude::*`.
pub mod prelude {
    pub use formmap_core::{FormmapError, FormmapResult, Message, MessageLevel, Settings};
    pub use formmap_forms::{
        BoundField, FieldDef, FieldValue, FilterRegistry, FormSession, FormType, PathBinder,
        Schema, SchemaSource, SchemaStore, TargetObject, ValidationContext, ValueFilter, VarType,
    };
    pub use formmap_http::{QueryDict, RequestData};
}
