//! AST Module - typed model of execution specs, tasks and workflows
//!
//! Contains parsed Rust types:
//! - `spec`: ExecutionSpec, Container, Volume, VolumeMount, PodMetadata
//! - `task`: Task, ResourceHandle, AccessMode
//! - `workflow`: Workflow, TaskDecl, Flow, FlowEndpoint
//!
//! These types represent the "what" - static structure. Graph construction
//! lives in `dag`, spec resolution in `merge`.

mod spec;
mod task;
mod workflow;

// Re-export all public types
pub use spec::{
    Container, ExecutionSpec, PodMetadata, ResourceLimits, Volume, VolumeMount, VolumeSource,
};
pub use task::{AccessMode, ResourceHandle, Task, DEFAULT_TASK_TIMEOUT};
pub use workflow::{Flow, FlowEndpoint, TaskDecl, TimeoutValue, Workflow, SCHEMA_V01};
