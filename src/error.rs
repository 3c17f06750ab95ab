// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! Podplan Error Types with Error Codes
//!
//! Error code ranges:
//! - PODPLAN-000-009: Workflow document errors
//! - PODPLAN-010-019: Merge errors
//! - PODPLAN-020-029: DAG errors
//! - PODPLAN-030-039: Hazard / plan errors
//! - PODPLAN-040-049: Config errors
//! - PODPLAN-090-099: IO / serialization errors

use miette::Diagnostic;
use thiserror::Error;

use crate::hazard::Hazard;

pub type Result<T> = std::result::Result<T, PodplanError>;

/// Render a hazard list as `a; b; c`
fn format_hazards(hazards: &[Hazard]) -> String {
    match hazards.len() {
        0 => "no hazards".to_string(),
        1 => hazards[0].to_string(),
        n => format!(
            "{} hazards: {}",
            n,
            hazards
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        ),
    }
}

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
///
/// Implements both `thiserror::Error` for std error compatibility
/// and `miette::Diagnostic` for terminal error display.
#[derive(Error, Debug, Diagnostic)]
pub enum PodplanError {
    // ═══════════════════════════════════════════
    // WORKFLOW DOCUMENT ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[PODPLAN-001] Invalid schema version: expected '{expected}', got '{actual}'")]
    #[diagnostic(code(podplan::invalid_schema))]
    InvalidSchema { expected: String, actual: String },

    #[error("[PODPLAN-002] Invalid duration '{value}' for task '{task_id}'")]
    #[diagnostic(code(podplan::invalid_duration))]
    InvalidDuration { task_id: String, value: String },

    #[error("[PODPLAN-003] Task '{task_id}' references unknown template '{template}'")]
    #[diagnostic(code(podplan::unknown_template))]
    UnknownTemplate { task_id: String, template: String },

    // ═══════════════════════════════════════════
    // MERGE ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[PODPLAN-010] Merge conflict on '{field}': {reason}")]
    #[diagnostic(code(podplan::merge_conflict))]
    MergeConflict { field: String, reason: String },

    // ═══════════════════════════════════════════
    // DAG ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[PODPLAN-020] Cycle detected in DAG: {cycle}")]
    #[diagnostic(code(podplan::cycle_detected))]
    CycleDetected { cycle: String },

    #[error("[PODPLAN-021] Unknown task '{task_id}'")]
    #[diagnostic(code(podplan::unknown_task))]
    UnknownTask { task_id: String },

    #[error("[PODPLAN-022] Task '{task_id}' is declared twice")]
    #[diagnostic(code(podplan::duplicate_task))]
    DuplicateTask { task_id: String },

    #[error("[PODPLAN-023] Invalid task id '{task_id}'")]
    #[diagnostic(code(podplan::invalid_task_id))]
    InvalidTaskId { task_id: String },

    #[error("[PODPLAN-024] Graph is finalized and can no longer be modified")]
    #[diagnostic(code(podplan::graph_finalized))]
    GraphFinalized,

    #[error("[PODPLAN-025] Graph must be finalized before {operation}")]
    #[diagnostic(code(podplan::graph_not_finalized))]
    GraphNotFinalized { operation: &'static str },

    // ═══════════════════════════════════════════
    // HAZARD / PLAN ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[PODPLAN-030] Plan invalid: {}", format_hazards(.hazards))]
    #[diagnostic(code(podplan::plan_invalid))]
    PlanInvalid { hazards: Vec<Hazard> },

    #[error("[PODPLAN-031] No effective spec provided for task '{task_id}'")]
    #[diagnostic(code(podplan::missing_spec))]
    MissingSpec { task_id: String },

    // ═══════════════════════════════════════════
    // CONFIG ERRORS (040-049)
    // ═══════════════════════════════════════════
    #[error("[PODPLAN-040] Configuration error: {reason}")]
    #[diagnostic(code(podplan::config_error))]
    ConfigError { reason: String },

    // ═══════════════════════════════════════════
    // IO / SERIALIZATION ERRORS (090-099)
    // ═══════════════════════════════════════════
    #[error("[PODPLAN-090] IO error: {0}")]
    #[diagnostic(code(podplan::io_error))]
    IoError(#[from] std::io::Error),

    #[error("[PODPLAN-091] JSON error: {0}")]
    #[diagnostic(code(podplan::json_error))]
    JsonError(#[from] serde_json::Error),

    #[error("[PODPLAN-092] YAML parse error: {0}")]
    #[diagnostic(code(podplan::yaml_parse))]
    YamlParse(#[from] serde_yaml::Error),
}

impl PodplanError {
    /// Get the error code (e.g., "PODPLAN-020")
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSchema { .. } => "PODPLAN-001",
            Self::InvalidDuration { .. } => "PODPLAN-002",
            Self::UnknownTemplate { .. } => "PODPLAN-003",
            Self::MergeConflict { .. } => "PODPLAN-010",
            Self::CycleDetected { .. } => "PODPLAN-020",
            Self::UnknownTask { .. } => "PODPLAN-021",
            Self::DuplicateTask { .. } => "PODPLAN-022",
            Self::InvalidTaskId { .. } => "PODPLAN-023",
            Self::GraphFinalized => "PODPLAN-024",
            Self::GraphNotFinalized { .. } => "PODPLAN-025",
            Self::PlanInvalid { .. } => "PODPLAN-030",
            Self::MissingSpec { .. } => "PODPLAN-031",
            Self::ConfigError { .. } => "PODPLAN-040",
            Self::IoError(_) => "PODPLAN-090",
            Self::JsonError(_) => "PODPLAN-091",
            Self::YamlParse(_) => "PODPLAN-092",
        }
    }

    /// Hazards carried by a `PlanInvalid` error (empty for every other variant)
    pub fn hazards(&self) -> &[Hazard] {
        match self {
            Self::PlanInvalid { hazards } => hazards,
            _ => &[],
        }
    }
}

impl FixSuggestion for PodplanError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            PodplanError::InvalidSchema { .. } => {
                Some("Use 'podplan/workflow@0.1' as the schema version")
            }
            PodplanError::InvalidDuration { .. } => {
                Some("Use a duration such as 90s, 15m, 2h or a number of seconds")
            }
            PodplanError::UnknownTemplate { .. } => {
                Some("Declare the template under templates: or fix the task's base reference")
            }
            PodplanError::MergeConflict { .. } => {
                Some("Give every container and volume a unique, non-empty name and declare mounted volumes")
            }
            PodplanError::CycleDetected { .. } => {
                Some("Remove circular dependencies from your workflow")
            }
            PodplanError::UnknownTask { .. } => {
                Some("Declare the task before adding flows that reference it")
            }
            PodplanError::DuplicateTask { .. } => Some("Use unique task ids"),
            PodplanError::InvalidTaskId { .. } => Some(
                "Task ids must start with a letter and contain only letters, digits, '-' or '_'",
            ),
            PodplanError::GraphFinalized => {
                Some("Add all tasks and flows before finalizing the graph")
            }
            PodplanError::GraphNotFinalized { .. } => Some("Call finalize() on the graph first"),
            PodplanError::PlanInvalid { .. } => Some(
                "Add a flow from each writer to every task reading the same volume, and order writers",
            ),
            PodplanError::MissingSpec { .. } => {
                Some("Resolve an effective spec for every task in the graph")
            }
            PodplanError::ConfigError { .. } => Some("Check the podplan config.toml syntax"),
            PodplanError::IoError(_) => Some("Check file path and permissions"),
            PodplanError::JsonError(_) => None,
            PodplanError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
        }
    }
}
