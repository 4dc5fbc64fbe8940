use ::common::api::ConnectorState;

pub fn colorize(text: &str, code: &str, enabled: bool) -> String {
    if enabled {
        format!("\x1b[{}m{}\x1b[0m", code, text)
    } else {
        text.to_string()
    }
}

pub fn color_state(state: &ConnectorState, enabled: bool) -> String {
    let label = state.as_str();
    match state {
        ConnectorState::Running => colorize(label, "32", enabled),
        ConnectorState::Paused => colorize(label, "33", enabled),
        ConnectorState::Failed => colorize(label, "31", enabled),
        ConnectorState::Unassigned => colorize(label, "36", enabled),
        ConnectorState::Restarting | ConnectorState::Other(_) => label.to_string(),
    }
}

pub fn format_optional_str(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

/// First line of a stack trace, or `-`.
pub fn first_line(value: Option<&str>) -> String {
    format_optional_str(value.and_then(|v| v.lines().next()))
}

/// `954ms`, `5s`, `2m 10s`, `1h 0m`. Seconds are dropped once the interval
/// reaches an hour.
pub fn format_poll_interval(ms: u64) -> String {
    if ms < 1000 {
        return format!("{ms}ms");
    }
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, _) => format!("{minutes}m {seconds}s"),
        _ => format!("{hours}h {minutes}m"),
    }
}
