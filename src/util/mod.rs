//! Utilities Module - shared infrastructure
//!
//! - `interner`: identifier interning (task ids, volume identities)
//! - `duration`: humane timeout parsing (`90s`, `15m`, `2h`)
//! - `id`: task id validation

mod duration;
mod id;
mod interner;

pub use duration::parse_duration;
pub use id::{is_valid_task_id, TASK_ID_PATTERN};
pub use interner::{intern, release_unused, Interner};
