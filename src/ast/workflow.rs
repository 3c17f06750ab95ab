//! Workflow Types - YAML document describing templates, tasks and flows
//!
//! Contains the YAML-parsed types:
//! - `Workflow`: Root document with templates, tasks and flows
//! - `TaskDecl`: Task as written in YAML (before timeout resolution)
//! - `Flow`: DAG edge between tasks
//! - `FlowEndpoint`: Single or multiple task references

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::config::PlannerConfig;
use crate::dag::TaskGraph;
use crate::error::{PodplanError, Result};
use crate::merge::TemplateCatalog;
use crate::util::parse_duration;

use super::spec::ExecutionSpec;
use super::task::{ResourceHandle, Task};

/// Expected schema version for v0.1 workflows
pub const SCHEMA_V01: &str = "podplan/workflow@0.1";

/// Workflow parsed from YAML
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Workflow {
    pub schema: String,
    /// DAG identifier, informational only
    #[serde(default)]
    pub id: Option<String>,
    /// Named base templates
    #[serde(default)]
    pub templates: BTreeMap<String, ExecutionSpec>,
    pub tasks: Vec<TaskDecl>,
    #[serde(default)]
    pub flows: Vec<Flow>,
}

/// Task as declared in the document
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskDecl {
    pub id: String,
    #[serde(default = "default_base")]
    pub base: String,
    #[serde(default, rename = "override")]
    pub override_spec: Option<ExecutionSpec>,
    /// `90s`, `15m`, `1h30m` or a bare number of seconds
    #[serde(default)]
    pub timeout: Option<TimeoutValue>,
    #[serde(default)]
    pub resources: Vec<ResourceHandle>,
}

/// Handles number OR string for `timeout`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TimeoutValue {
    Seconds(u64),
    Text(String),
}

fn default_base() -> String {
    "default".to_string()
}

impl TaskDecl {
    /// Resolve into a graph task, applying `default_timeout` when unset
    pub fn to_task(&self, default_timeout: Duration) -> Result<Task> {
        let timeout = match &self.timeout {
            None => default_timeout,
            Some(TimeoutValue::Seconds(secs)) => Duration::from_secs(*secs),
            Some(TimeoutValue::Text(text)) => {
                parse_duration(text).ok_or_else(|| PodplanError::InvalidDuration {
                    task_id: self.id.clone(),
                    value: text.clone(),
                })?
            }
        };

        let mut task = Task::new(&self.id, &self.base).with_timeout(timeout);
        task.override_spec = self.override_spec.clone();
        task.handles = self.resources.clone();
        Ok(task)
    }
}

/// Dependency edge(s): every source precedes every target
#[derive(Debug, Clone, Deserialize)]
pub struct Flow {
    pub source: FlowEndpoint,
    pub target: FlowEndpoint,
}

/// Handles string OR array for source/target
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FlowEndpoint {
    Single(String),
    Multiple(Vec<String>),
}

impl FlowEndpoint {
    pub fn as_vec(&self) -> Vec<&str> {
        match self {
            FlowEndpoint::Single(s) => vec![s.as_str()],
            FlowEndpoint::Multiple(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

impl Workflow {
    /// Parse a workflow from YAML text and check its schema
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let workflow: Workflow = serde_yaml::from_str(yaml)?;
        workflow.validate_schema()?;
        Ok(workflow)
    }

    /// Read and parse a workflow file
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Validate the workflow schema version
    pub fn validate_schema(&self) -> Result<()> {
        if self.schema != SCHEMA_V01 {
            return Err(PodplanError::InvalidSchema {
                expected: SCHEMA_V01.to_string(),
                actual: self.schema.clone(),
            });
        }
        Ok(())
    }

    /// Number of edges the flows expand to
    pub fn edge_count(&self) -> usize {
        self.flows
            .iter()
            .map(|f| f.source.as_vec().len() * f.target.as_vec().len())
            .sum()
    }

    /// Catalog of the document's templates
    pub fn catalog(&self) -> TemplateCatalog {
        self.templates
            .iter()
            .map(|(name, spec)| (name.as_str(), spec.clone()))
            .collect()
    }

    /// Build and finalize the task graph
    ///
    /// Tasks are added in document order, then flows are expanded into
    /// edges. Fails on invalid timeouts, duplicate or unknown ids and cycles.
    pub fn build_graph(&self, config: &PlannerConfig) -> Result<TaskGraph> {
        let default_timeout = config.default_timeout();
        let mut graph = TaskGraph::with_capacity(self.tasks.len());

        for decl in &self.tasks {
            graph.add_task(decl.to_task(default_timeout)?)?;
        }

        for flow in &self.flows {
            for source in flow.source.as_vec() {
                for target in flow.target.as_vec() {
                    graph.add_edge(source, target)?;
                }
            }
        }

        graph.finalize()?;
        debug!(
            workflow = self.id.as_deref().unwrap_or("<anonymous>"),
            tasks = graph.len(),
            edges = graph.edge_count(),
            "workflow graph built"
        );
        Ok(graph)
    }
}
