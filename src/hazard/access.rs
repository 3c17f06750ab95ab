//! Volume access collection
//!
//! Gathers, per volume identity, which tasks touch it and how. Declared
//! handles are authoritative; mounts of claim-backed volumes in the effective
//! spec are added only for volumes a task did not declare.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::ast::{AccessMode, ExecutionSpec};
use crate::dag::TaskGraph;
use crate::util::intern;

/// Where an access came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOrigin {
    Declared,
    /// Derived from a volume mount in the effective spec
    Mount,
}

/// One task's combined access to one volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeAccess {
    pub task_id: Arc<str>,
    pub access: AccessMode,
    pub origin: AccessOrigin,
}

/// volume identity -> accesses, tasks in graph execution order
pub type AccessMap = BTreeMap<Arc<str>, Vec<VolumeAccess>>;

/// Collect accesses for every task of a finalized graph
///
/// `order` is the graph's execution order; a task without an entry in
/// `spec_of` contributes only its declared handles.
pub fn collect_accesses<'a, F>(
    graph: &TaskGraph,
    order: &[Arc<str>],
    spec_of: F,
    derive_from_mounts: bool,
) -> AccessMap
where
    F: Fn(&str) -> Option<&'a ExecutionSpec>,
{
    let mut map = AccessMap::new();

    for task_id in order {
        let Some(task) = graph.task(task_id) else {
            continue;
        };

        // Per-task combined access, keyed by volume
        let mut declared: BTreeMap<Arc<str>, AccessMode> = BTreeMap::new();
        for handle in &task.handles {
            declared
                .entry(Arc::clone(&handle.volume))
                .and_modify(|mode| *mode = mode.union(handle.access))
                .or_insert(handle.access);
        }

        let mut derived: BTreeMap<Arc<str>, AccessMode> = BTreeMap::new();
        if derive_from_mounts {
            if let Some(spec) = spec_of(task_id.as_ref()) {
                for (volume, mode) in mount_accesses(spec) {
                    if declared.contains_key(&volume) {
                        continue;
                    }
                    derived
                        .entry(volume)
                        .and_modify(|m| *m = m.union(mode))
                        .or_insert(mode);
                }
            }
        }

        let tagged = declared
            .into_iter()
            .map(|(v, m)| (v, m, AccessOrigin::Declared))
            .chain(derived.into_iter().map(|(v, m)| (v, m, AccessOrigin::Mount)));
        for (volume, access, origin) in tagged {
            map.entry(volume).or_default().push(VolumeAccess {
                task_id: Arc::clone(task_id),
                access,
                origin,
            });
        }
    }

    map
}

/// (claim name, access) for every mount of a claim-backed volume
fn mount_accesses(spec: &ExecutionSpec) -> impl Iterator<Item = (Arc<str>, AccessMode)> + '_ {
    spec.containers
        .iter()
        .flat_map(|c| c.volume_mounts.iter())
        .filter_map(|mount| {
            let claim = spec.volume(&mount.name)?.claim_name()?;
            let mode = if mount.read_only {
                AccessMode::Read
            } else {
                AccessMode::ReadWrite
            };
            Some((intern(claim), mode))
        })
}
