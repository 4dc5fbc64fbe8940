use std::fmt::Write as _;

use crate::diff::DiffResults;

pub fn render_diff(results: &DiffResults) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "NEW CONNECTORS: {}", results.new_connectors.len());
    for name in &results.new_connectors {
        let _ = writeln!(out, "  + {name}");
    }

    let _ = writeln!(out, "CHANGED CONNECTORS: {}", results.changed_connectors.len());
    for diff in &results.changed_connectors {
        let _ = writeln!(out, "  ~ {}", diff.connector);
        for (key, value) in &diff.new_keys {
            let _ = writeln!(out, "      + {key}: {value}");
        }
        for (key, values) in &diff.mismatch_keys {
            let _ = writeln!(out, "      ~ {key}: {} -> {}", values.deployed, values.file);
        }
        for (key, value) in &diff.removed_keys {
            let _ = writeln!(out, "      - {key}: {value}");
        }
    }

    let _ = writeln!(out, "UNCHANGED CONNECTORS: {}", results.unchanged_connectors.len());
    for name in &results.unchanged_connectors {
        let _ = writeln!(out, "  = {name}");
    }

    if !results.excluded.is_empty() {
        let _ = writeln!(out, "NOT COMPARED: {}", results.excluded.len());
        for excluded in &results.excluded {
            let _ = writeln!(
                out,
                "  ! {} ({}): {}",
                excluded.connector, excluded.file, excluded.reason
            );
        }
    }

    out
}
