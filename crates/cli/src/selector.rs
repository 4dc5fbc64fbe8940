use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionIntent {
    Quit,
    All,
    Ids(Vec<usize>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no connector selected")]
    Empty,
    #[error("could not parse connector id '{token}' in selection '{input}'")]
    InvalidId { input: String, token: String },
}

/// Parses an operator selection. `q` anywhere quits, then `all` anywhere
/// selects everything, otherwise the input must be comma separated ids.
pub fn parse_selection(input: &str) -> Result<SelectionIntent, SelectionError> {
    let trimmed = input.trim();
    let lowered = trimmed.to_ascii_lowercase();

    if lowered.contains('q') {
        debug!(input = trimmed, "quit requested");
        return Ok(SelectionIntent::Quit);
    }
    if lowered.contains("all") {
        return Ok(SelectionIntent::All);
    }
    if trimmed.is_empty() {
        return Err(SelectionError::Empty);
    }

    let mut ids = Vec::new();
    for token in trimmed.split(',') {
        let token = token.trim();
        let id = token
            .parse::<usize>()
            .map_err(|_| SelectionError::InvalidId {
                input: trimmed.to_string(),
                token: token.to_string(),
            })?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(SelectionIntent::Ids(ids))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quit_takes_precedence_over_everything() {
        assert_eq!(parse_selection("q,1"), Ok(SelectionIntent::Quit));
        assert_eq!(parse_selection("Q"), Ok(SelectionIntent::Quit));
        assert_eq!(parse_selection("all,q"), Ok(SelectionIntent::Quit));
    }

    #[test]
    fn all_takes_precedence_over_ids() {
        assert_eq!(parse_selection("all"), Ok(SelectionIntent::All));
        assert_eq!(parse_selection(" ALL \n"), Ok(SelectionIntent::All));
        assert_eq!(parse_selection("1,all"), Ok(SelectionIntent::All));
    }

    #[test]
    fn ids_are_comma_separated_and_deduplicated() {
        assert_eq!(
            parse_selection("1,2,3"),
            Ok(SelectionIntent::Ids(vec![1, 2, 3]))
        );
        assert_eq!(
            parse_selection(" 4 , 0,4"),
            Ok(SelectionIntent::Ids(vec![4, 0]))
        );
    }

    #[test]
    fn garbage_is_an_error() {
        assert_eq!(
            parse_selection("x"),
            Err(SelectionError::InvalidId {
                input: "x".into(),
                token: "x".into()
            })
        );
        assert!(parse_selection("1,,2").is_err());
        assert!(parse_selection("-1").is_err());
        assert_eq!(parse_selection("   "), Err(SelectionError::Empty));
    }
}
