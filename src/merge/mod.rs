//! Merge Module - base template + override fragment → effective spec
//!
//! Merge policy:
//! - Containers merge by name. Base-only containers are kept verbatim,
//!   fragment-only containers are appended, and for a shared name every
//!   non-empty fragment field replaces the base field (image, command,
//!   args, volume mounts). Resource limits merge key-wise, fragment wins.
//! - Volumes merge by name: replaced when present, appended when absent.
//! - Annotations and labels merge key-wise, fragment wins.
//!
//! `merge` is pure and deterministic: the same inputs always produce the same
//! output, and merging an empty fragment returns the base unchanged.

mod catalog;

pub use catalog::{SpecMap, TemplateCatalog};

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::ast::{Container, ExecutionSpec, PodMetadata, Volume};
use crate::error::{PodplanError, Result};

/// Merge `fragment` onto `base`
///
/// Fails with `MergeConflict` when a container has no name, when one input
/// declares the same container or volume name twice, or when a mount in the
/// result references an undeclared volume.
pub fn merge(base: &ExecutionSpec, fragment: &ExecutionSpec) -> Result<ExecutionSpec> {
    check_containers("base", &base.containers)?;
    check_containers("override", &fragment.containers)?;
    check_volumes("base", &base.volumes)?;
    check_volumes("override", &fragment.volumes)?;

    let merged = ExecutionSpec {
        metadata: merge_metadata(&base.metadata, &fragment.metadata),
        containers: merge_containers(&base.containers, &fragment.containers),
        volumes: merge_volumes(&base.volumes, &fragment.volumes),
    };

    check_mounts(&merged)?;

    debug!(
        containers = merged.containers.len(),
        volumes = merged.volumes.len(),
        overridden = fragment.containers.len(),
        "merged execution spec"
    );
    Ok(merged)
}

fn merge_metadata(base: &PodMetadata, fragment: &PodMetadata) -> PodMetadata {
    PodMetadata {
        annotations: union(&base.annotations, &fragment.annotations),
        labels: union(&base.labels, &fragment.labels),
    }
}

/// Key-wise union, `fragment` wins on collision
fn union(base: &BTreeMap<String, String>, fragment: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut out = base.clone();
    out.extend(fragment.iter().map(|(k, v)| (k.clone(), v.clone())));
    out
}

fn merge_containers(base: &[Container], fragment: &[Container]) -> Vec<Container> {
    let mut out: Vec<Container> = base
        .iter()
        .map(|b| match fragment.iter().find(|f| f.name == b.name) {
            Some(f) => merge_container(b, f),
            None => b.clone(),
        })
        .collect();

    out.extend(
        fragment
            .iter()
            .filter(|f| !base.iter().any(|b| b.name == f.name))
            .cloned(),
    );
    out
}

/// Field-by-field container merge; unset fragment fields fall back to base
fn merge_container(base: &Container, fragment: &Container) -> Container {
    Container {
        name: base.name.clone(),
        image: fragment.image.clone().or_else(|| base.image.clone()),
        command: pick(&base.command, &fragment.command),
        args: pick(&base.args, &fragment.args),
        resources: union(&base.resources, &fragment.resources),
        volume_mounts: pick(&base.volume_mounts, &fragment.volume_mounts),
    }
}

#[inline]
fn pick<T: Clone>(base: &[T], fragment: &[T]) -> Vec<T> {
    if fragment.is_empty() {
        base.to_vec()
    } else {
        fragment.to_vec()
    }
}

fn merge_volumes(base: &[Volume], fragment: &[Volume]) -> Vec<Volume> {
    let mut out: Vec<Volume> = base
        .iter()
        .map(|b| {
            fragment
                .iter()
                .find(|f| f.name == b.name)
                .unwrap_or(b)
                .clone()
        })
        .collect();

    out.extend(
        fragment
            .iter()
            .filter(|f| !base.iter().any(|b| b.name == f.name))
            .cloned(),
    );
    out
}

fn check_containers(side: &str, containers: &[Container]) -> Result<()> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for container in containers {
        if container.name.is_empty() {
            return Err(PodplanError::MergeConflict {
                field: "containers.name".to_string(),
                reason: format!("{side} declares a container without a name"),
            });
        }
        if !seen.insert(container.name.as_str()) {
            return Err(PodplanError::MergeConflict {
                field: format!("containers.{}", container.name),
                reason: format!("{side} declares container '{}' twice", container.name),
            });
        }
    }
    Ok(())
}

fn check_volumes(side: &str, volumes: &[Volume]) -> Result<()> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for volume in volumes {
        if !seen.insert(volume.name.as_str()) {
            return Err(PodplanError::MergeConflict {
                field: format!("volumes.{}", volume.name),
                reason: format!("{side} declares volume '{}' twice", volume.name),
            });
        }
    }
    Ok(())
}

fn check_mounts(spec: &ExecutionSpec) -> Result<()> {
    for container in &spec.containers {
        for mount in &container.volume_mounts {
            if spec.volume(&mount.name).is_none() {
                return Err(PodplanError::MergeConflict {
                    field: format!("containers.{}.volume_mounts", container.name),
                    reason: format!(
                        "mount '{}' at {} references undeclared volume",
                        mount.name, mount.mount_path
                    ),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::VolumeMount;
    use pretty_assertions::assert_eq;

    fn base() -> ExecutionSpec {
        ExecutionSpec::new()
            .with_annotation("team", "data")
            .with_label("tier", "batch")
            .with_container(
                Container::new("base")
                    .image("apache/airflow:2.1.0")
                    .command(["airflow", "tasks", "run"])
                    .limit("cpu", "1")
                    .limit("memory", "512Mi"),
            )
    }

    #[test]
    fn empty_fragment_returns_base() {
        let b = base();
        assert_eq!(merge(&b, &ExecutionSpec::new()).unwrap(), b);
    }

    #[test]
    fn image_override_keeps_other_fields() {
        let fragment = ExecutionSpec::new().with_container(Container::new("base").image("airflow:2.2"));
        let merged = merge(&base(), &fragment).unwrap();
        let c = merged.container("base").unwrap();
        assert_eq!(c.image.as_deref(), Some("airflow:2.2"));
        assert_eq!(c.command, ["airflow", "tasks", "run"]);
        assert_eq!(c.resources.get("cpu").map(String::as_str), Some("1"));
    }

    #[test]
    fn name_only_container_is_noop() {
        let fragment = ExecutionSpec::new().with_container(Container::new("base"));
        assert_eq!(merge(&base(), &fragment).unwrap(), base());
    }

    #[test]
    fn limits_merge_keywise() {
        let fragment = ExecutionSpec::new().with_container(
            Container::new("base")
                .limit("memory", "2000Mi")
                .limit("nvidia.com/gpu", "1"),
        );
        let merged = merge(&base(), &fragment).unwrap();
        let limits = &merged.container("base").unwrap().resources;
        assert_eq!(limits.len(), 3);
        assert_eq!(limits["cpu"], "1");
        assert_eq!(limits["memory"], "2000Mi");
        assert_eq!(limits["nvidia.com/gpu"], "1");
    }

    #[test]
    fn fragment_only_container_appended() {
        let fragment = ExecutionSpec::new()
            .with_container(Container::new("sidecar").image("busybox:latest"));
        let merged = merge(&base(), &fragment).unwrap();
        let names: Vec<&str> = merged.containers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["base", "sidecar"]);
    }

    #[test]
    fn metadata_union_fragment_wins() {
        let fragment = ExecutionSpec::new()
            .with_annotation("team", "ml")
            .with_annotation("test", "annotation");
        let merged = merge(&base(), &fragment).unwrap();
        assert_eq!(merged.metadata.annotations["team"], "ml");
        assert_eq!(merged.metadata.annotations["test"], "annotation");
        assert_eq!(merged.metadata.labels["tier"], "batch");
    }

    #[test]
    fn volumes_replaced_by_name_or_appended() {
        let b = base()
            .with_volume(Volume::empty_dir("scratch"))
            .with_volume(Volume::claim("data", "old-claim"));
        let fragment = ExecutionSpec::new()
            .with_volume(Volume::claim("data", "new-claim"))
            .with_volume(Volume::empty_dir("cache"));
        let merged = merge(&b, &fragment).unwrap();
        let names: Vec<&str> = merged.volumes.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["scratch", "data", "cache"]);
        assert_eq!(merged.volume("data").unwrap().claim_name(), Some("new-claim"));
    }

    #[test]
    fn merge_is_idempotent() {
        let fragment = ExecutionSpec::new()
            .with_container(Container::new("base").args(["--verbose"]))
            .with_label("tier", "interactive");
        let once = merge(&base(), &fragment).unwrap();
        assert_eq!(merge(&base(), &fragment).unwrap(), once);
        assert_eq!(merge(&once, &fragment).unwrap(), once);
    }

    #[test]
    fn duplicate_container_name_conflicts() {
        let fragment = ExecutionSpec::new()
            .with_container(Container::new("sidecar"))
            .with_container(Container::new("sidecar"));
        let err = merge(&base(), &fragment).unwrap_err();
        assert!(matches!(err, PodplanError::MergeConflict { ref field, .. } if field == "containers.sidecar"));
    }

    #[test]
    fn unnamed_container_conflicts() {
        let fragment = ExecutionSpec::new().with_container(Container::new(""));
        assert!(matches!(
            merge(&base(), &fragment),
            Err(PodplanError::MergeConflict { .. })
        ));
    }

    #[test]
    fn undeclared_mount_conflicts() {
        let fragment = ExecutionSpec::new().with_container(
            Container::new("sidecar").mount(VolumeMount::new("missing", "/data")),
        );
        let err = merge(&base(), &fragment).unwrap_err();
        assert!(err.to_string().contains("undeclared volume"));
    }

    #[test]
    fn mount_may_reference_base_volume() {
        let b = base().with_volume(Volume::claim("shared", "shared"));
        let fragment = ExecutionSpec::new().with_container(
            Container::new("base").mount(VolumeMount::new("shared", "/data").read_only()),
        );
        let merged = merge(&b, &fragment).unwrap();
        assert!(merged.container("base").unwrap().volume_mounts[0].read_only);
    }
}
