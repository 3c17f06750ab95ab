//! Task id validation

use once_cell::sync::Lazy;
use regex::Regex;

/// Starts with a letter, then letters, digits, `-` or `_`
pub const TASK_ID_PATTERN: &str = r"^[a-zA-Z][a-zA-Z0-9_-]*$";

static TASK_ID: Lazy<Regex> = Lazy::new(|| Regex::new(TASK_ID_PATTERN).unwrap());

pub fn is_valid_task_id(id: &str) -> bool {
    TASK_ID.is_match(id)
}
