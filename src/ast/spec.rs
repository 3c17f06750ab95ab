//! Execution Spec Types - format-agnostic pod description
//!
//! The same types describe a base template, a per-task override fragment and
//! the effective spec produced by merging the two. In a fragment, an unset
//! field (`None` image, empty list, empty map) means "keep the base value".
//!
//! ```yaml
//! metadata:
//!   annotations: { test: annotation }
//! containers:
//!   - name: sidecar
//!     image: busybox:latest
//!     command: [sh, -cx]
//!     resources: { cpu: "2", memory: 2000Mi }
//!     volume_mounts:
//!       - name: workflow-pvc
//!         mount_path: /mydrive/
//! volumes:
//!   - name: workflow-pvc
//!     persistent_volume_claim: { claim_name: workflow-pvc }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Resource limits keyed by resource name (`cpu`, `memory`, ...)
pub type ResourceLimits = BTreeMap<String, String>;

/// Pod-level metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PodMetadata {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl PodMetadata {
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty() && self.labels.is_empty()
    }
}

/// A volume mounted into a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumeMount {
    /// Name of a volume declared in the spec's `volumes`
    pub name: String,
    pub mount_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_path: Option<String>,
    #[serde(default)]
    pub read_only: bool,
}

impl VolumeMount {
    pub fn new(name: impl Into<String>, mount_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mount_path: mount_path.into(),
            sub_path: None,
            read_only: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// A single container of the pod
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Container {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: ResourceLimits,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, resource: impl Into<String>, quantity: impl Into<String>) -> Self {
        self.resources.insert(resource.into(), quantity.into());
        self
    }

    pub fn mount(mut self, mount: VolumeMount) -> Self {
        self.volume_mounts.push(mount);
        self
    }
}

/// Backing storage of a volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeSource {
    PersistentVolumeClaim { claim_name: String },
    EmptyDir {},
    ConfigMap { name: String },
    HostPath { path: String },
}

/// A named volume declared at pod level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    #[serde(flatten)]
    pub source: VolumeSource,
}

impl Volume {
    /// Volume backed by a persistent volume claim
    pub fn claim(name: impl Into<String>, claim_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: VolumeSource::PersistentVolumeClaim {
                claim_name: claim_name.into(),
            },
        }
    }

    pub fn empty_dir(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: VolumeSource::EmptyDir {},
        }
    }

    /// Claim name when backed by a persistent volume claim
    pub fn claim_name(&self) -> Option<&str> {
        match &self.source {
            VolumeSource::PersistentVolumeClaim { claim_name } => Some(claim_name),
            _ => None,
        }
    }
}

/// Execution spec: containers, volumes and pod metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExecutionSpec {
    #[serde(default, skip_serializing_if = "PodMetadata::is_empty")]
    pub metadata: PodMetadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<Container>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
}

impl ExecutionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the spec sets nothing (a no-op override)
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty() && self.containers.is_empty() && self.volumes.is_empty()
    }

    pub fn container(&self, name: &str) -> Option<&Container> {
        self.containers.iter().find(|c| c.name == name)
    }

    pub fn volume(&self, name: &str) -> Option<&Volume> {
        self.volumes.iter().find(|v| v.name == name)
    }

    pub fn with_container(mut self, container: Container) -> Self {
        self.containers.push(container);
        self
    }

    pub fn with_volume(mut self, volume: Volume) -> Self {
        self.volumes.push(volume);
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.annotations.insert(key.into(), value.into());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.labels.insert(key.into(), value.into());
        self
    }
}
