//! Hazard Module - shared-volume ordering analysis
//!
//! For every volume identity, every writer must reach every reader through
//! dependency edges, and every pair of writers must be ordered one way or the
//! other. Anything else is a hazard:
//!
//! | Pair | Requirement | Hazard |
//! |------|-------------|--------|
//! | writer W, pure reader R | path W → R | `MissingOrderingEdge` |
//! | writer A, writer B | path A → B or B → A | `ConcurrentWriteWrite` |
//! | `read_write` A before writer B | path A → B or B → A | `ConcurrentWriteWrite` only |
//!
//! `read_write` accesses count as writers. A pair in which both tasks write
//! only needs an ordering in either direction: a `read_write` task ordered
//! before a pure writer is not reported, while a pure reader in the same
//! position is a `MissingOrderingEdge` (the writer can never reach it).
//! Writable claim mounts derive `read_write`, so chained writers sharing a
//! mounted claim stay valid.
//!
//! The analysis is structural: it reads declared handles, effective-spec
//! mounts and graph edges, nothing else.

mod access;

pub use access::{collect_accesses, AccessMap, AccessOrigin, VolumeAccess};

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::config::PlannerConfig;
use crate::dag::TaskGraph;
use crate::error::Result;
use crate::merge::SpecMap;

/// Kind of a hazard, without its data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    MissingOrderingEdge,
    ConcurrentWriteWrite,
}

/// An unordered access pair on a shared volume
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Hazard {
    /// `reader` is not reachable from `writer`
    MissingOrderingEdge {
        volume: Arc<str>,
        writer: Arc<str>,
        reader: Arc<str>,
    },
    /// Neither writer reaches the other (`first` precedes `second` in order)
    ConcurrentWriteWrite {
        volume: Arc<str>,
        first: Arc<str>,
        second: Arc<str>,
    },
}

impl Hazard {
    pub fn kind(&self) -> HazardKind {
        match self {
            Self::MissingOrderingEdge { .. } => HazardKind::MissingOrderingEdge,
            Self::ConcurrentWriteWrite { .. } => HazardKind::ConcurrentWriteWrite,
        }
    }

    pub fn volume(&self) -> &str {
        match self {
            Self::MissingOrderingEdge { volume, .. } | Self::ConcurrentWriteWrite { volume, .. } => {
                volume
            }
        }
    }

    /// The two tasks involved (writer/reader, or first/second writer)
    pub fn tasks(&self) -> (&str, &str) {
        match self {
            Self::MissingOrderingEdge { writer, reader, .. } => (&**writer, &**reader),
            Self::ConcurrentWriteWrite { first, second, .. } => (&**first, &**second),
        }
    }

    pub fn involves(&self, task_id: &str) -> bool {
        let (a, b) = self.tasks();
        a == task_id || b == task_id
    }
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingOrderingEdge {
                volume,
                writer,
                reader,
            } => write!(
                f,
                "volume '{volume}': '{reader}' reads without depending on writer '{writer}'"
            ),
            Self::ConcurrentWriteWrite {
                volume,
                first,
                second,
            } => write!(
                f,
                "volume '{volume}': writers '{first}' and '{second}' are not ordered"
            ),
        }
    }
}

/// Structural analyzer for shared-volume hazards
#[derive(Debug, Clone, Copy)]
pub struct HazardAnalyzer {
    derive_mount_handles: bool,
}

impl Default for HazardAnalyzer {
    fn default() -> Self {
        Self {
            derive_mount_handles: true,
        }
    }
}

impl HazardAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            derive_mount_handles: config.analysis.derive_mount_handles,
        }
    }

    /// Toggle deriving handles from claim-backed volume mounts
    pub fn with_mount_derivation(mut self, enabled: bool) -> Self {
        self.derive_mount_handles = enabled;
        self
    }

    /// Find every hazard in a finalized graph
    ///
    /// Returns an empty list when the declared access pattern is safe. Fails
    /// only with `GraphNotFinalized`. Output is ordered by volume identity,
    /// then by execution order of the tasks involved.
    pub fn analyze(&self, graph: &TaskGraph, specs: &SpecMap) -> Result<Vec<Hazard>> {
        let order = graph.require_finalized("hazard analysis")?;
        let accesses = collect_accesses(
            graph,
            order,
            |id| specs.get(id).map(|spec| &**spec),
            self.derive_mount_handles,
        );

        let mut hazards = Vec::new();
        for (volume, tasks) in &accesses {
            check_volume(graph, volume, tasks, &mut hazards);
        }

        for hazard in &hazards {
            warn!(kind = ?hazard.kind(), volume = hazard.volume(), "{}", hazard);
        }
        Ok(hazards)
    }
}

/// Pairwise check of one volume's accesses
///
/// `tasks` is in execution order, so for `i < j` the only possible path is
/// `tasks[i] → tasks[j]`.
fn check_volume(graph: &TaskGraph, volume: &Arc<str>, tasks: &[VolumeAccess], out: &mut Vec<Hazard>) {
    for (i, earlier) in tasks.iter().enumerate() {
        for later in &tasks[i + 1..] {
            let (a, b) = (earlier.access, later.access);
            if !a.writes() && !b.writes() {
                continue;
            }
            let ordered = graph.has_path(&earlier.task_id, &later.task_id);

            if a.writes() && b.writes() {
                if !ordered {
                    out.push(Hazard::ConcurrentWriteWrite {
                        volume: Arc::clone(volume),
                        first: Arc::clone(&earlier.task_id),
                        second: Arc::clone(&later.task_id),
                    });
                }
            } else if a.writes() {
                // earlier writes, later only reads
                if !ordered {
                    out.push(Hazard::MissingOrderingEdge {
                        volume: Arc::clone(volume),
                        writer: Arc::clone(&earlier.task_id),
                        reader: Arc::clone(&later.task_id),
                    });
                }
            } else {
                // Reader precedes writer: the writer can never reach it
                out.push(Hazard::MissingOrderingEdge {
                    volume: Arc::clone(volume),
                    writer: Arc::clone(&later.task_id),
                    reader: Arc::clone(&earlier.task_id),
                });
            }
        }
    }
}
