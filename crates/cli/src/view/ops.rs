use super::{format::colorize, table::render_table};
use crate::ops::{OperationOutcome, OutcomeResult};

pub fn render_outcomes(outcomes: &[OperationOutcome], color: bool) -> String {
    let headers = ["ID", "CONNECTOR", "TASK", "RESULT"];
    let rows = outcomes
        .iter()
        .map(|outcome| {
            let result = match &outcome.result {
                OutcomeResult::Done { status } => {
                    colorize(&format!("ok ({})", status.as_u16()), "32", color)
                }
                OutcomeResult::Failed { error } => colorize(&format!("failed: {error}"), "31", color),
                OutcomeResult::NotFound => colorize("not found", "33", color),
            };
            vec![
                outcome.connector_id.to_string(),
                outcome.connector.clone().unwrap_or_else(|| "-".to_string()),
                outcome
                    .task_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                result,
            ]
        })
        .collect::<Vec<_>>();
    render_table(&headers, &rows)
}
