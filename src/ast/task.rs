//! Task Types - task declaration and resource handles
//!
//! A task names its base template, optionally carries an override fragment,
//! and declares which shared volumes it reads and writes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

use crate::util::intern;

use super::spec::ExecutionSpec;

/// Timeout applied when a task does not set one (15 minutes)
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// How a task touches a shared volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    Read,
    Write,
    ReadWrite,
}

impl AccessMode {
    #[inline]
    pub fn reads(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    #[inline]
    pub fn writes(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }

    /// Combined access of two handles on the same volume
    pub fn union(self, other: Self) -> Self {
        if self == other {
            self
        } else {
            Self::ReadWrite
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::ReadWrite => "read_write",
        })
    }
}

/// (volume identity, mount path, access mode)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceHandle {
    /// Identity of the backing volume, shared across tasks
    pub volume: Arc<str>,
    #[serde(rename = "path", default)]
    pub mount_path: String,
    pub access: AccessMode,
}

impl ResourceHandle {
    pub fn new(volume: &str, mount_path: impl Into<String>, access: AccessMode) -> Self {
        Self {
            volume: intern(volume),
            mount_path: mount_path.into(),
            access,
        }
    }

    pub fn read(volume: &str, mount_path: impl Into<String>) -> Self {
        Self::new(volume, mount_path, AccessMode::Read)
    }

    pub fn write(volume: &str, mount_path: impl Into<String>) -> Self {
        Self::new(volume, mount_path, AccessMode::Write)
    }

    pub fn read_write(volume: &str, mount_path: impl Into<String>) -> Self {
        Self::new(volume, mount_path, AccessMode::ReadWrite)
    }
}

/// A node of the task graph
///
/// Immutable once added to a `TaskGraph` (the graph stores it behind `Arc`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: Arc<str>,
    /// Name of the base template in the catalog
    pub base: Arc<str>,
    #[serde(rename = "override", skip_serializing_if = "Option::is_none")]
    pub override_spec: Option<ExecutionSpec>,
    #[serde(rename = "timeout_secs", serialize_with = "serialize_secs")]
    pub timeout: Duration,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub handles: Vec<ResourceHandle>,
}

impl Task {
    pub fn new(id: &str, base: &str) -> Self {
        Self {
            id: intern(id),
            base: intern(base),
            override_spec: None,
            timeout: DEFAULT_TASK_TIMEOUT,
            handles: Vec::new(),
        }
    }

    pub fn with_override(mut self, fragment: ExecutionSpec) -> Self {
        self.override_spec = Some(fragment);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_handle(mut self, handle: ResourceHandle) -> Self {
        self.handles.push(handle);
        self
    }

    pub fn reads(self, volume: &str, mount_path: &str) -> Self {
        self.with_handle(ResourceHandle::read(volume, mount_path))
    }

    pub fn writes(self, volume: &str, mount_path: &str) -> Self {
        self.with_handle(ResourceHandle::write(volume, mount_path))
    }
}

fn serialize_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}
