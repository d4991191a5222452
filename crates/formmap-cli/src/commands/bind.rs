//! The `bind` command.
//!
//! Runs one request through the whole pipeline: loads definitions, binds a
//! query string and body, validates a form, and prints the validation
//! messages and the generated object as JSON.

use std::path::PathBuf;

use formmap_core::logging::request_span;
use formmap_core::{FormmapError, FormmapResult, Settings};
use formmap_forms::{SchemaSource, SchemaStore};
use formmap_http::RequestData;

use crate::command::ManagementCommand;

/// Binds request data to a form and prints the outcome.
pub struct BindCommand;

/// What to bind and where.
#[derive(Debug, Clone, Default)]
pub struct BindOptions {
    /// Definition files to load.
    pub definitions: Vec<PathBuf>,
    /// `namespace.form_id`, or a bare form id looked up in every namespace.
    pub form: String,
    /// The query string.
    pub query: String,
    /// The request body.
    pub body: Option<String>,
    /// The body's content type.
    pub content_type: String,
}

/// Runs the pipeline and returns `{form, class, invalid, messages, object}`.
pub fn run_bind(options: &BindOptions, settings: &Settings) -> FormmapResult<serde_json::Value> {
    let store = SchemaStore::new(settings.clone());
    for file in &options.definitions {
        store.load(&SchemaSource::file(file.clone()))?;
    }

    let request = RequestData::builder()
        .query_string(&options.query)
        .content_type(&options.content_type)
        .body(options.body.clone().unwrap_or_default().into_bytes())
        .build()?;

    let schema = store.snapshot();
    let group = match options.form.split_once('.') {
        Some((namespace, form_id)) => schema.group(namespace, form_id),
        None => schema.find_group(&options.form),
    }
    .ok_or_else(|| FormmapError::UnknownForm(options.form.clone()))?;

    let span = request_span("cli");
    let _guard = span.enter();

    let mut session = store.session();
    session.bind(&request, false);
    let invalid = session.validate_group(&group.namespace, &group.form_id)?;
    let object = session.generate(&group.namespace, &group.form_id)?;

    Ok(serde_json::json!({
        "form": format!("{}.{}", group.namespace, group.form_id),
        "class": object.class(),
        "invalid": invalid,
        "messages": session.take_messages(),
        "object": object.into_json(),
    }))
}

impl ManagementCommand for BindCommand {
    fn name(&self) -> &'static str {
        "bind"
    }

    fn help(&self) -> &'static str {
        "Bind request data to a form, validate it, and print the generated object"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("definitions")
                .long("definitions")
                .short('d')
                .required(true)
                .num_args(1..)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Definition files (JSON or TOML)"),
        )
        .arg(
            clap::Arg::new("form")
                .long("form")
                .short('f')
                .required(true)
                .help("Form to validate: namespace.form_id or form_id"),
        )
        .arg(
            clap::Arg::new("query")
                .long("query")
                .short('q')
                .default_value("")
                .help("Query string"),
        )
        .arg(
            clap::Arg::new("body")
                .long("body")
                .short('b')
                .help("Request body"),
        )
        .arg(
            clap::Arg::new("content-type")
                .long("content-type")
                .default_value("application/x-www-form-urlencoded")
                .help("Content type of the body"),
        )
    }

    fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> FormmapResult<()> {
        let text = |name: &str| matches.get_one::<String>(name).cloned().unwrap_or_default();
        let options = BindOptions {
            definitions: matches
                .get_many::<PathBuf>("definitions")
                .map(|files| files.cloned().collect())
                .unwrap_or_default(),
            form: text("form"),
            query: text("query"),
            body: matches.get_one::<String>("body").cloned(),
            content_type: text("content-type"),
        };

        let outcome = run_bind(&options, settings)?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const DOC: &str = r#"{"shop": {"search": {"class": "SearchQuery", "fields": {
        "q": {"form_type": "search", "var_type": "string", "required": true,
              "property": "keyword", "filters": "like"},
        "page": {"form_type": "hidden", "var_type": "int", "property": "page"}
    }}}}"#;

    fn options(dir: &tempfile::TempDir) -> BindOptions {
        let path = dir.path().join("search.json");
        fs::write(&path, DOC).unwrap();
        BindOptions {
            definitions: vec![path],
            form: "shop.search".into(),
            content_type: "application/x-www-form-urlencoded".into(),
            ..BindOptions::default()
        }
    }

    #[test]
    fn test_bind_valid_request() {
        let dir = tempfile::tempdir().unwrap();
        let opts = BindOptions {
            query: "q=boots".into(),
            body: Some("page=2".into()),
            ..options(&dir)
        };
        let out = run_bind(&opts, &Settings::default()).unwrap();
        assert_eq!(out["invalid"], 0);
        assert_eq!(out["class"], "SearchQuery");
        assert_eq!(out["object"], serde_json::json!({"keyword": "%boots%", "page": 2}));
    }

    #[test]
    fn test_bind_reports_messages() {
        let dir = tempfile::tempdir().unwrap();
        let opts = BindOptions {
            form: "search".into(),
            query: "page=x".into(),
            ..options(&dir)
        };
        let out = run_bind(&opts, &Settings::default()).unwrap();
        assert_eq!(out["invalid"], 2);
        assert_eq!(out["messages"].as_array().map(Vec::len), Some(2));
        assert_eq!(out["messages"][0]["name"], "q");
        assert_eq!(out["messages"][0]["level"], "error");
    }

    #[test]
    fn test_bind_json_body() {
        let dir = tempfile::tempdir().unwrap();
        let opts = BindOptions {
            body: Some(r#"{"q": "hat", "page": 3}"#.into()),
            content_type: "application/json".into(),
            ..options(&dir)
        };
        let out = run_bind(&opts, &Settings::default()).unwrap();
        assert_eq!(out["object"]["page"], 3);
    }

    #[test]
    fn test_bind_unknown_form() {
        let dir = tempfile::tempdir().unwrap();
        let opts = BindOptions {
            form: "shop.cart".into(),
            ..options(&dir)
        };
        assert!(matches!(
            run_bind(&opts, &Settings::default()),
            Err(FormmapError::UnknownForm(_))
        ));
    }
}
