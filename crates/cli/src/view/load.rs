use std::fmt::Write as _;

use super::{format::colorize, table::render_table};
use crate::config_file::ConfigFile;
use crate::pipeline::ApplyResult;

fn validation_label(file: &ConfigFile) -> &'static str {
    if !file.is_readable() {
        "unreadable"
    } else if file.is_valid() {
        "valid"
    } else {
        "invalid"
    }
}

/// Per-file verdicts followed by every error found.
pub fn render_validation_report(files: &[ConfigFile], color: bool) -> String {
    let headers = ["CONNECTOR", "FILE", "VALIDATION"];
    let rows = files
        .iter()
        .map(|file| {
            let label = validation_label(file);
            let code = if file.is_valid() { "32" } else { "31" };
            vec![
                file.connector_name.clone(),
                file.file_name.display().to_string(),
                colorize(label, code, color),
            ]
        })
        .collect::<Vec<_>>();

    let mut out = format!("VALIDATION: {} file(s)\n", files.len());
    out.push_str(&render_table(&headers, &rows));
    out.push('\n');

    for file in files {
        for warning in &file.warnings {
            let _ = writeln!(out, "warning  {}: {warning}", file.connector_name);
        }
        if let Some(error) = &file.error {
            let _ = writeln!(out, "error    {}: {error}", file.connector_name);
        }
        if let Some(error) = &file.validation_error {
            let _ = writeln!(out, "error    {}: {error}", file.connector_name);
        }
        if let Some(validation) = &file.validation {
            for field in validation.field_errors() {
                let _ = writeln!(
                    out,
                    "error    {}: field {} - {}",
                    file.connector_name,
                    field.name,
                    field.errors.join("; ")
                );
            }
        }
    }
    out
}

pub fn render_apply_report(files: &[ConfigFile]) -> String {
    let headers = ["CONNECTOR", "RESULT"];
    let rows = files
        .iter()
        .filter_map(|file| {
            let result = match file.apply.as_ref()? {
                ApplyResult::Applied(status) => format!("applied ({})", status.as_u16()),
                ApplyResult::Failed(err) => format!("failed: {err}"),
            };
            Some(vec![file.connector_name.clone(), result])
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}
