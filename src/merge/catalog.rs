//! Template catalog - named base specs and per-task resolution

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::ast::{ExecutionSpec, Task};
use crate::dag::TaskGraph;
use crate::error::{PodplanError, Result};
use crate::util::intern;

use super::merge;

/// Effective specs keyed by task id
pub type SpecMap = FxHashMap<Arc<str>, Arc<ExecutionSpec>>;

/// Named base templates
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: BTreeMap<Arc<str>, Arc<ExecutionSpec>>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template, replacing any previous one with the same name
    pub fn insert(&mut self, name: &str, spec: ExecutionSpec) {
        self.templates.insert(intern(name), Arc::new(spec));
    }

    pub fn with_template(mut self, name: &str, spec: ExecutionSpec) -> Self {
        self.insert(name, spec);
        self
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&Arc<ExecutionSpec>> {
        self.templates.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.templates.keys().map(|k| &**k)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Effective spec of one task: its override merged onto its base template
    pub fn effective_spec(&self, task: &Task) -> Result<ExecutionSpec> {
        let base = self
            .get(&task.base)
            .ok_or_else(|| PodplanError::UnknownTemplate {
                task_id: task.id.to_string(),
                template: task.base.to_string(),
            })?;

        match &task.override_spec {
            Some(fragment) => merge(base, fragment),
            None => merge(base, &ExecutionSpec::default()),
        }
    }

    /// Effective specs of every task in the graph
    pub fn resolve(&self, graph: &TaskGraph) -> Result<SpecMap> {
        let mut specs: SpecMap =
            FxHashMap::with_capacity_and_hasher(graph.len(), Default::default());
        for task in graph.tasks() {
            let spec = self.effective_spec(task)?;
            specs.insert(Arc::clone(&task.id), Arc::new(spec));
        }
        debug!(tasks = specs.len(), templates = self.len(), "resolved effective specs");
        Ok(specs)
    }
}

impl<S: AsRef<str>> FromIterator<(S, ExecutionSpec)> for TemplateCatalog {
    fn from_iter<I: IntoIterator<Item = (S, ExecutionSpec)>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for (name, spec) in iter {
            catalog.insert(name.as_ref(), spec);
        }
        catalog
    }
}
