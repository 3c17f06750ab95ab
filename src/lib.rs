//! Podplan - execution planning for Kubernetes-pod task DAGs
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  ast/       Rust types (ExecutionSpec, Task, Workflow)       │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  merge/     Base template + override → effective spec        │
//! │  dag/       Task graph (TaskGraph, finalize, has_path)       │
//! │  hazard/    Shared-volume ordering analysis                  │
//! │  plan/      ExecutionPlanner → ExecutionPlan                 │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  util/      Utilities (interner, id validation, durations)   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`ast`] | Spec, task and workflow types, YAML parsing |
//! | [`merge`] | Pure spec merge, template catalog |
//! | [`dag`] | Dependency graph with FxHashMap optimization |
//! | [`hazard`] | Missing-edge and write-write detection |
//! | [`plan`] | Hazard-free ordered plan for the dispatcher |
//! | [`util`] | String interning, task-id pattern, duration parsing |
//! | [`config`] | Planner settings (TOML + env) |
//! | [`error`] | Error types with fix suggestions |
//!
//! ## Example
//!
//! ```
//! use podplan::{Container, ExecutionPlanner, ExecutionSpec, Task, TaskGraph, TemplateCatalog};
//!
//! let catalog = TemplateCatalog::new().with_template(
//!     "default",
//!     ExecutionSpec::new().with_container(Container::new("base").image("airflow")),
//! );
//!
//! let mut graph = TaskGraph::new();
//! graph.add_task(Task::new("write", "default").writes("shared", "/data")).unwrap();
//! graph.add_task(Task::new("read", "default").reads("shared", "/data")).unwrap();
//! graph.add_edge("write", "read").unwrap();
//! graph.finalize().unwrap();
//!
//! let plan = ExecutionPlanner::default().build(&graph, &catalog).unwrap();
//! assert_eq!(plan.order(), ["write", "read"]);
//! ```

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL - Rust types
// ═══════════════════════════════════════════════════════════════
pub mod ast;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER - Merge, graph, analysis, planning
// ═══════════════════════════════════════════════════════════════
pub mod dag;
pub mod hazard;
pub mod merge;
pub mod plan;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER - Utilities
// ═══════════════════════════════════════════════════════════════
pub mod util;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// Re-export commonly used types
pub use ast::{
    AccessMode, Container, ExecutionSpec, PodMetadata, ResourceHandle, Task, Volume, VolumeMount,
    VolumeSource, Workflow,
};
pub use config::PlannerConfig;
pub use dag::TaskGraph;
pub use error::{FixSuggestion, PodplanError, Result};
pub use hazard::{Hazard, HazardAnalyzer, HazardKind};
pub use merge::{merge, SpecMap, TemplateCatalog};
pub use plan::{ExecutionPlan, ExecutionPlanner, PlanStep};
