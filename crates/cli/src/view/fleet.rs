use super::{
    format::{color_state, first_line, format_optional_str},
    table::render_table,
};
use crate::fleet::FleetSnapshot;
use crate::summary::SummaryRegistry;

/// Connector rows followed by their task rows (`<connector>.<task>`).
pub fn render_fleet_table(
    fleet: &FleetSnapshot,
    summaries: &SummaryRegistry,
    wide: bool,
    colorize: bool,
) -> String {
    let mut headers = vec!["ID", "NAME", "STATE", "WORKER", "TRACE"];
    if wide {
        headers.push("POLL");
    }

    let mut rows = Vec::new();
    for connector in fleet.iter() {
        let mut row = vec![
            connector.id.to_string(),
            connector.name.clone(),
            color_state(&connector.state, colorize),
            format_optional_str(Some(&connector.worker_id)),
            "-".to_string(),
        ];
        if wide {
            row.push(format_optional_str(connector.poll_interval().as_deref()));
        }
        rows.push(row);

        for task in &connector.tasks {
            let summary = summaries.summarize_task(connector, task);
            let mut row = vec![
                format!("{}.{}", connector.id, task.id),
                format!("  {}", format_optional_str(Some(&summary))),
                color_state(&task.state, colorize),
                format_optional_str(Some(&task.worker_id)),
                first_line(task.trace.as_deref()),
            ];
            if wide {
                row.push(String::new());
            }
            rows.push(row);
        }
    }

    format!(
        "CONNECTORS: {}\n{}",
        fleet.len(),
        render_table(&headers, &rows)
    )
}
