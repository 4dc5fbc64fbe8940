pub mod diff;
pub mod fleet;
pub mod format;
pub mod load;
pub mod ops;
pub mod state;
pub mod table;

use serde::Serialize;

pub fn to_pretty_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
