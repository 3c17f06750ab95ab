//! DAG Module - task graph structure
//!
//! - `graph`: TaskGraph (tasks + dependency edges, cycle detection,
//!   deterministic topological order, BFS reachability)
//!
//! The graph is built once, finalized, then only read. Hazard analysis and
//! planning require a finalized graph.

mod graph;

pub use graph::{DepVec, TaskGraph};
