use super::table::render_table;
use crate::state::{ReconcileAction, ReconcileEntry};

pub fn render_reconcile(entries: &[ReconcileEntry]) -> String {
    let headers = ["LINE", "CONNECTOR", "ACTION"];
    let rows = entries
        .iter()
        .map(|entry| {
            let action = match &entry.action {
                ReconcileAction::Transitioned { from, to, result } => match result {
                    Ok(_) => format!("{from} -> {to}"),
                    Err(err) => format!("{from} -> {to} failed: {err}"),
                },
                ReconcileAction::AlreadySatisfied(state) => format!("already {state}"),
                ReconcileAction::NotReconcilable(state) => format!("skipped, connector is {state}"),
                ReconcileAction::UnsupportedTarget(target) => {
                    format!("skipped, unsupported target {target}")
                }
                ReconcileAction::InvalidLine(line) => format!("skipped, unparseable line '{line}'"),
            };
            vec![
                entry.line.to_string(),
                entry.connector.clone().unwrap_or_else(|| "-".to_string()),
                action,
            ]
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}
