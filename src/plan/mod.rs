//! Plan Module - ordered, hazard-free execution plan
//!
//! `ExecutionPlanner` is the single integration point for the dispatcher:
//! finalized graph + effective specs in, `ExecutionPlan` out. Any hazard
//! blocks the plan with `PlanInvalid`.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::info;

use crate::ast::{ExecutionSpec, Task};
use crate::config::PlannerConfig;
use crate::dag::{DepVec, TaskGraph};
use crate::error::{PodplanError, Result};
use crate::hazard::HazardAnalyzer;
use crate::merge::{SpecMap, TemplateCatalog};

/// One task of the plan with its effective spec
#[derive(Debug, Clone, Serialize)]
pub struct PlanStep {
    /// Zero-based position in execution order
    pub position: usize,
    pub task: Arc<Task>,
    /// Direct upstream tasks
    pub dependencies: DepVec,
    pub spec: Arc<ExecutionSpec>,
}

impl PlanStep {
    #[inline]
    pub fn id(&self) -> &str {
        &self.task.id
    }
}

/// Tasks in topological order paired with their effective specs
///
/// Immutable; clone-cheap parts are `Arc`-shared so the plan can be read from
/// several threads.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionPlan {
    steps: Vec<PlanStep>,
    #[serde(skip)]
    positions: FxHashMap<Arc<str>, usize>,
}

impl ExecutionPlan {
    #[inline]
    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn step(&self, task_id: &str) -> Option<&PlanStep> {
        self.position(task_id).map(|i| &self.steps[i])
    }

    #[inline]
    pub fn position(&self, task_id: &str) -> Option<usize> {
        self.positions.get(task_id).copied()
    }

    /// Task ids in execution order
    pub fn order(&self) -> Vec<&str> {
        self.steps.iter().map(PlanStep::id).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlanStep> {
        self.steps.iter()
    }
}

impl<'a> IntoIterator for &'a ExecutionPlan {
    type Item = &'a PlanStep;
    type IntoIter = std::slice::Iter<'a, PlanStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

/// Composes hazard analysis and ordering into an `ExecutionPlan`
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionPlanner {
    analyzer: HazardAnalyzer,
}

impl ExecutionPlanner {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            analyzer: HazardAnalyzer::from_config(config),
        }
    }

    pub fn with_analyzer(analyzer: HazardAnalyzer) -> Self {
        Self { analyzer }
    }

    #[inline]
    pub fn analyzer(&self) -> &HazardAnalyzer {
        &self.analyzer
    }

    /// Build a plan from a finalized graph and its effective specs
    ///
    /// Fails with `GraphNotFinalized`, `MissingSpec` for a task without a
    /// spec, or `PlanInvalid` carrying every hazard found.
    pub fn plan(&self, graph: &TaskGraph, specs: &SpecMap) -> Result<ExecutionPlan> {
        let order = graph.require_finalized("planning")?;

        if let Some(missing) = order.iter().find(|&id| !specs.contains_key(id)) {
            return Err(PodplanError::MissingSpec {
                task_id: missing.to_string(),
            });
        }

        let hazards = self.analyzer.analyze(graph, specs)?;
        if !hazards.is_empty() {
            return Err(PodplanError::PlanInvalid { hazards });
        }

        let mut steps = Vec::with_capacity(order.len());
        let mut positions = FxHashMap::with_capacity_and_hasher(order.len(), Default::default());
        for (position, id) in order.iter().enumerate() {
            let (Some(task), Some(spec)) = (graph.task(id), specs.get(id)) else {
                return Err(PodplanError::MissingSpec {
                    task_id: id.to_string(),
                });
            };
            positions.insert(Arc::clone(id), position);
            steps.push(PlanStep {
                position,
                task: Arc::clone(task),
                dependencies: graph.get_dependencies(id).iter().cloned().collect(),
                spec: Arc::clone(spec),
            });
        }

        info!(tasks = steps.len(), edges = graph.edge_count(), "execution plan ready");
        Ok(ExecutionPlan { steps, positions })
    }

    /// Resolve every task's effective spec from `catalog`, then plan
    pub fn build(&self, graph: &TaskGraph, catalog: &TemplateCatalog) -> Result<ExecutionPlan> {
        let specs = catalog.resolve(graph)?;
        self.plan(graph, &specs)
    }
}
