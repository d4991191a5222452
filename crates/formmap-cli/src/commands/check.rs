//! The `check` command.
//!
//! Loads definition files the way the engine does and reports the forms
//! they declare. Any configuration error (missing file, unknown form type,
//! var type, or filter) fails the check.

use std::collections::HashMap;
use std::path::PathBuf;

use formmap_core::{FormmapError, FormmapResult, Settings};
use formmap_forms::Schema;

use crate::command::ManagementCommand;

/// Loads definition files and reports their forms.
pub struct CheckCommand;

/// One form found by the check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSummary {
    /// `namespace.form_id`.
    pub name: String,
    /// The declared target class.
    pub class: String,
    /// Number of fields.
    pub fields: usize,
    /// Number of fields with a property path.
    pub mapped: usize,
}

/// The outcome of a check.
#[derive(Debug, Clone, Default)]
pub struct CheckReport {
    /// Every form, in load order.
    pub forms: Vec<FormSummary>,
    /// Non-fatal findings.
    pub warnings: Vec<String>,
}

/// Loads every file into one schema and summarizes it.
pub fn check_definitions(files: &[PathBuf], settings: &Settings) -> FormmapResult<CheckReport> {
    let mut schema = Schema::from_settings(settings);
    for file in files {
        schema.load_file(file.clone())?;
    }

    let mut report = CheckReport::default();
    let mut owners: HashMap<&str, String> = HashMap::new();

    for group in schema.groups() {
        let name = format!("{}.{}", group.namespace, group.form_id);
        let mapped = group
            .keys
            .iter()
            .filter_map(|key| schema.field(key))
            .filter(|def| def.property.is_some())
            .count();

        for key in &group.keys {
            if let Some(previous) = owners.insert(key.as_str(), name.clone()) {
                if previous != name {
                    report
                        .warnings
                        .push(format!("field '{key}' is shared by {previous} and {name}"));
                }
            }
        }
        if mapped == 0 {
            report
                .warnings
                .push(format!("{name} maps no field onto {}", group.target_class));
        }

        report.forms.push(FormSummary {
            name,
            class: group.target_class.clone(),
            fields: group.keys.len(),
            mapped,
        });
    }
    Ok(report)
}

impl ManagementCommand for CheckCommand {
    fn name(&self) -> &'static str {
        "check"
    }

    fn help(&self) -> &'static str {
        "Check definition files for configuration errors"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("files")
                .required(true)
                .num_args(1..)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Definition files (JSON or TOML)"),
        )
    }

    fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> FormmapResult<()> {
        let files: Vec<PathBuf> = matches
            .get_many::<PathBuf>("files")
            .ok_or_else(|| FormmapError::ConfigurationError("No definition files given".into()))?
            .cloned()
            .collect();

        let report = check_definitions(&files, settings)?;
        for form in &report.forms {
            println!(
                "{} -> {} ({} fields, {} mapped)",
                form.name, form.class, form.fields, form.mapped
            );
        }
        for warning in &report.warnings {
            tracing::warn!("{warning}");
        }
        tracing::info!(
            "Check identified {} form(s), {} warning(s)",
            report.forms.len(),
            report.warnings.len()
        );
        Ok(())
    }
}
