//! TaskGraph - task declarations + dependency edges (optimized)
//!
//! Performance optimizations:
//! - Arc<str> for zero-cost cloning of task IDs
//! - FxHashMap for faster hashing (non-crypto, ~2x faster)
//! - SmallVec for stack-allocated small dependency lists (0-4 items)
//!
//! Lifecycle: build (`add_task` / `add_edge`) → `finalize` → read-only.
//! Finalization runs cycle detection (DFS three-color) and computes a
//! topological order with ties broken by declaration order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use tracing::debug;

use crate::ast::Task;
use crate::error::{PodplanError, Result};
use crate::util::is_valid_task_id;

/// Stack-allocated deps: most tasks have 0-4 dependencies
pub type DepVec = SmallVec<[Arc<str>; 4]>;

/// Graph of tasks and their dependency edges
///
/// Mutation takes `&mut self`; once finalized the graph is immutable and can be
/// shared across threads behind `Arc`.
#[derive(Debug, Default)]
pub struct TaskGraph {
    /// task_id -> task declaration
    tasks: FxHashMap<Arc<str>, Arc<Task>>,
    /// task_id -> list of successor task_ids
    adjacency: FxHashMap<Arc<str>, DepVec>,
    /// task_id -> list of predecessor task_ids (dependencies)
    predecessors: FxHashMap<Arc<str>, DepVec>,
    /// All task IDs in declaration order
    task_ids: Vec<Arc<str>>,
    /// task_id -> declaration index (tie-breaker for the topological order)
    declared_at: FxHashMap<Arc<str>, usize>,
    edge_count: usize,
    /// Set by `finalize`
    order: Option<Vec<Arc<str>>>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tasks: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            adjacency: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            predecessors: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            task_ids: Vec::with_capacity(capacity),
            declared_at: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            edge_count: 0,
            order: None,
        }
    }

    /// Declare a task
    ///
    /// Fails with `GraphFinalized`, `InvalidTaskId` or `DuplicateTask`.
    pub fn add_task(&mut self, task: Task) -> Result<()> {
        if self.order.is_some() {
            return Err(PodplanError::GraphFinalized);
        }
        if !is_valid_task_id(&task.id) {
            return Err(PodplanError::InvalidTaskId {
                task_id: task.id.to_string(),
            });
        }
        if self.tasks.contains_key(task.id.as_ref()) {
            return Err(PodplanError::DuplicateTask {
                task_id: task.id.to_string(),
            });
        }

        let id = Arc::clone(&task.id);
        self.declared_at.insert(Arc::clone(&id), self.task_ids.len());
        self.task_ids.push(Arc::clone(&id));
        self.adjacency.insert(Arc::clone(&id), DepVec::new());
        self.predecessors.insert(Arc::clone(&id), DepVec::new());
        self.tasks.insert(id, Arc::new(task));
        Ok(())
    }

    /// Declare that `to` may only start after `from` completed
    ///
    /// Fails with `GraphFinalized` or `UnknownTask`. Repeating an edge is a no-op.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<()> {
        if self.order.is_some() {
            return Err(PodplanError::GraphFinalized);
        }
        let src = self.lookup(from)?;
        let tgt = self.lookup(to)?;

        let successors = self.adjacency.entry(Arc::clone(&src)).or_default();
        if successors.iter().any(|s| *s == tgt) {
            return Ok(());
        }
        successors.push(Arc::clone(&tgt));
        self.predecessors.entry(tgt).or_default().push(src);
        self.edge_count += 1;
        Ok(())
    }

    /// Validate acyclicity and freeze the graph
    ///
    /// Returns the topological execution order. Ties between ready tasks are
    /// broken by declaration order, so the same graph always yields the same
    /// order. Calling it again returns the order computed the first time.
    pub fn finalize(&mut self) -> Result<&[Arc<str>]> {
        if self.order.is_none() {
            self.detect_cycles()?;
            let order = self.topological_order();
            debug!(
                tasks = self.task_ids.len(),
                edges = self.edge_count,
                "task graph finalized"
            );
            self.order = Some(order);
        }
        Ok(self.order.as_deref().unwrap_or_default())
    }

    #[inline]
    pub fn is_finalized(&self) -> bool {
        self.order.is_some()
    }

    /// Topological order, `None` until finalized
    #[inline]
    pub fn execution_order(&self) -> Option<&[Arc<str>]> {
        self.order.as_deref()
    }

    /// Topological order, or `GraphNotFinalized` naming the attempted operation
    pub fn require_finalized(&self, operation: &'static str) -> Result<&[Arc<str>]> {
        self.execution_order()
            .ok_or(PodplanError::GraphNotFinalized { operation })
    }

    /// Position of a task in the execution order
    pub fn position(&self, task_id: &str) -> Option<usize> {
        self.order
            .as_ref()?
            .iter()
            .position(|id| id.as_ref() == task_id)
    }

    /// Get a task declaration
    #[inline]
    pub fn task(&self, task_id: &str) -> Option<&Arc<Task>> {
        self.tasks.get(task_id)
    }

    /// Tasks in declaration order
    pub fn tasks(&self) -> impl Iterator<Item = &Arc<Task>> + '_ {
        self.task_ids.iter().filter_map(|id| self.tasks.get(id))
    }

    /// Task IDs in declaration order
    #[inline]
    pub fn task_ids(&self) -> &[Arc<str>] {
        &self.task_ids
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.task_ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.task_ids.is_empty()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Check if task exists
    #[inline]
    pub fn contains(&self, task_id: &str) -> bool {
        self.tasks.contains_key(task_id)
    }

    /// Get dependencies of a task (returns Arc<str> slice)
    #[inline]
    pub fn get_dependencies(&self, task_id: &str) -> &[Arc<str>] {
        static EMPTY: &[Arc<str>] = &[];
        self.predecessors
            .get(task_id)
            .map_or(EMPTY, SmallVec::as_slice)
    }

    /// Get successors of a task
    #[inline]
    pub fn get_successors(&self, task_id: &str) -> &[Arc<str>] {
        static EMPTY: &[Arc<str>] = &[];
        self.adjacency
            .get(task_id)
            .map_or(EMPTY, SmallVec::as_slice)
    }

    /// Find tasks with no successors (final tasks), in declaration order
    pub fn get_final_tasks(&self) -> Vec<Arc<str>> {
        self.task_ids
            .iter()
            .filter(|id| {
                self.adjacency
                    .get(id.as_ref())
                    .is_none_or(SmallVec::is_empty)
            })
            .cloned()
            .collect()
    }

    /// Check if there's a path from `from` to `to` (BFS)
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        if from == to {
            return true;
        }

        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut queue: VecDeque<&str> = VecDeque::new();

        queue.push_back(from);
        visited.insert(from);

        while let Some(current) = queue.pop_front() {
            if let Some(neighbors) = self.adjacency.get(current) {
                for neighbor in neighbors {
                    if neighbor.as_ref() == to {
                        return true;
                    }
                    if visited.insert(neighbor.as_ref()) {
                        queue.push_back(neighbor.as_ref());
                    }
                }
            }
        }

        false
    }

    fn lookup(&self, task_id: &str) -> Result<Arc<str>> {
        self.tasks
            .get(task_id)
            .map(|t| Arc::clone(&t.id))
            .ok_or_else(|| PodplanError::UnknownTask {
                task_id: task_id.to_string(),
            })
    }

    /// Kahn's algorithm with a min-heap on declaration index
    ///
    /// Must only run on an acyclic graph.
    fn topological_order(&self) -> Vec<Arc<str>> {
        let mut in_degree: FxHashMap<&str, usize> = self
            .task_ids
            .iter()
            .map(|id| (id.as_ref(), self.get_dependencies(id).len()))
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = self
            .task_ids
            .iter()
            .enumerate()
            .filter(|(_, id)| in_degree.get(id.as_ref()) == Some(&0))
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(self.task_ids.len());
        while let Some(Reverse(index)) = ready.pop() {
            let id = &self.task_ids[index];
            order.push(Arc::clone(id));

            for successor in self.get_successors(id) {
                if let Some(degree) = in_degree.get_mut(successor.as_ref()) {
                    *degree -= 1;
                    if *degree == 0 {
                        if let Some(&at) = self.declared_at.get(successor) {
                            ready.push(Reverse(at));
                        }
                    }
                }
            }
        }

        order
    }

    /// Detect cycles in the DAG using DFS with three-color marking.
    ///
    /// Returns `Err(PodplanError::CycleDetected)` with the cycle path if found.
    ///
    /// - White: unvisited
    /// - Gray: currently in DFS stack (visiting)
    /// - Black: fully processed (all descendants visited)
    ///
    /// A cycle is detected when we encounter a Gray node while traversing.
    /// The traversal keeps an explicit frame stack, so path length is bounded
    /// by heap, not by thread stack.
    pub fn detect_cycles(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut colors: FxHashMap<&str, Color> = self
            .task_ids
            .iter()
            .map(|id| (id.as_ref(), Color::White))
            .collect();
        // (node, index of the next successor to visit); frames are the gray path
        let mut frames: Vec<(&Arc<str>, usize)> = Vec::new();

        for root in &self.task_ids {
            if colors.get(root.as_ref()) != Some(&Color::White) {
                continue;
            }
            colors.insert(root.as_ref(), Color::Gray);
            frames.push((root, 0));

            while let Some(frame) = frames.last_mut() {
                let node = frame.0;
                let Some(neighbor) = self.get_successors(node).get(frame.1) else {
                    colors.insert(node.as_ref(), Color::Black);
                    frames.pop();
                    continue;
                };
                frame.1 += 1;

                match colors.get(neighbor.as_ref()).copied() {
                    Some(Color::Gray) => {
                        // Gray means the neighbor is on the current DFS path
                        let cycle_start = frames
                            .iter()
                            .position(|&(n, _)| n == neighbor)
                            .unwrap_or(0);
                        let cycle: Vec<&str> =
                            frames[cycle_start..].iter().map(|(n, _)| n.as_ref()).collect();
                        return Err(PodplanError::CycleDetected {
                            cycle: format!("{} → {}", cycle.join(" → "), neighbor),
                        });
                    }
                    Some(Color::White) => {
                        colors.insert(neighbor.as_ref(), Color::Gray);
                        frames.push((neighbor, 0));
                    }
                    Some(Color::Black) | None => {}
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(ids: &[&str], edges: &[(&str, &str)]) -> TaskGraph {
        let mut g = TaskGraph::new();
        for id in ids {
            g.add_task(Task::new(id, "default")).unwrap();
        }
        for (from, to) in edges {
            g.add_edge(from, to).unwrap();
        }
        g
    }

    fn ids(order: &[Arc<str>]) -> Vec<&str> {
        order.iter().map(|s| s.as_ref()).collect()
    }

    // ═══════════════════════════════════════════════════════════════
    // CYCLE DETECTION TESTS
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_detect_cycle_simple() {
        // A → B → C → A (cycle)
        let mut g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let err = g.finalize().unwrap_err();
        assert!(matches!(err, PodplanError::CycleDetected { .. }));
        assert!(err.to_string().contains("PODPLAN-020"));
        assert!(!g.is_finalized());
    }

    #[test]
    fn test_self_loop_is_cycle() {
        let mut g = graph(&["a"], &[("a", "a")]);
        let err = g.finalize().unwrap_err();
        assert!(err.to_string().contains("a → a"));
    }

    #[test]
    fn test_cycle_path_names_cycle_members() {
        let mut g = graph(
            &["start", "a", "b"],
            &[("start", "a"), ("a", "b"), ("b", "a")],
        );
        match g.finalize().unwrap_err() {
            PodplanError::CycleDetected { cycle } => {
                assert!(cycle.contains('a') && cycle.contains('b'));
                assert!(!cycle.contains("start"));
            }
            other => panic!("expected CycleDetected, got {other}"),
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // ORDERING TESTS
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_linear_order() {
        let mut g = graph(&["c", "b", "a"], &[("a", "b"), ("b", "c")]);
        assert_eq!(ids(g.finalize().unwrap()), ["a", "b", "c"]);
    }

    #[test]
    fn test_ties_follow_declaration_order() {
        // start → {z, y, x}: siblings keep declaration order
        let mut g = graph(
            &["start", "z", "y", "x"],
            &[("start", "x"), ("start", "y"), ("start", "z")],
        );
        assert_eq!(ids(g.finalize().unwrap()), ["start", "z", "y", "x"]);
    }

    #[test]
    fn test_no_edges_keeps_declaration_order() {
        let mut g = graph(&["b", "a", "c"], &[]);
        assert_eq!(ids(g.finalize().unwrap()), ["b", "a", "c"]);
    }

    #[test]
    fn test_diamond() {
        let mut g = graph(
            &["a", "b", "c", "d"],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        );
        assert_eq!(ids(g.finalize().unwrap()), ["a", "b", "c", "d"]);
        assert_eq!(g.get_final_tasks().len(), 1);
        assert!(g.has_path("a", "d"));
        assert!(!g.has_path("b", "c"));
    }

    #[test]
    fn test_finalize_twice_returns_same_order() {
        let mut g = graph(&["a", "b"], &[("b", "a")]);
        let first: Vec<Arc<str>> = g.finalize().unwrap().to_vec();
        let second: Vec<Arc<str>> = g.finalize().unwrap().to_vec();
        assert_eq!(first, second);
        assert_eq!(g.position("b"), Some(0));
        assert_eq!(g.position("a"), Some(1));
    }

    // ═══════════════════════════════════════════════════════════════
    // BUILD ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_edge_to_unknown_task() {
        let mut g = graph(&["a"], &[]);
        let err = g.add_edge("a", "ghost").unwrap_err();
        assert!(matches!(err, PodplanError::UnknownTask { ref task_id } if task_id == "ghost"));
        let err = g.add_edge("ghost", "a").unwrap_err();
        assert!(matches!(err, PodplanError::UnknownTask { .. }));
    }

    #[test]
    fn test_duplicate_task() {
        let mut g = graph(&["a"], &[]);
        let err = g.add_task(Task::new("a", "other")).unwrap_err();
        assert!(matches!(err, PodplanError::DuplicateTask { .. }));
    }

    #[test]
    fn test_invalid_task_id() {
        let mut g = TaskGraph::new();
        let err = g.add_task(Task::new("9lives", "default")).unwrap_err();
        assert!(matches!(err, PodplanError::InvalidTaskId { .. }));
    }

    #[test]
    fn test_mutation_after_finalize() {
        let mut g = graph(&["a", "b"], &[]);
        g.finalize().unwrap();
        assert!(matches!(
            g.add_task(Task::new("c", "default")),
            Err(PodplanError::GraphFinalized)
        ));
        assert!(matches!(
            g.add_edge("a", "b"),
            Err(PodplanError::GraphFinalized)
        ));
    }

    #[test]
    fn test_repeated_edge_recorded_once() {
        let mut g = graph(&["a", "b"], &[("a", "b"), ("a", "b")]);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.get_dependencies("b").len(), 1);
        assert_eq!(ids(g.finalize().unwrap()), ["a", "b"]);
    }

    #[test]
    fn test_long_chain_finalizes() {
        // t0 → t1 → ... → t99999
        const N: usize = 100_000;
        let mut g = TaskGraph::with_capacity(N);
        for i in 0..N {
            g.add_task(Task::new(&format!("t{i}"), "default")).unwrap();
        }
        for i in 1..N {
            g.add_edge(&format!("t{}", i - 1), &format!("t{i}")).unwrap();
        }

        let order = g.finalize().unwrap();
        assert_eq!(order.len(), N);
        assert_eq!(&*order[0], "t0");
        assert_eq!(&*order[N - 1], "t99999");
    }

    #[test]
    fn test_long_chain_with_back_edge_is_cycle() {
        const N: usize = 50_000;
        let mut g = TaskGraph::with_capacity(N);
        for i in 0..N {
            g.add_task(Task::new(&format!("t{i}"), "default")).unwrap();
        }
        for i in 1..N {
            g.add_edge(&format!("t{}", i - 1), &format!("t{i}")).unwrap();
        }
        g.add_edge("t49999", "t0").unwrap();

        match g.finalize().unwrap_err() {
            PodplanError::CycleDetected { cycle } => {
                assert!(cycle.starts_with("t0 → t1 → "));
                assert!(cycle.ends_with("t49999 → t0"));
            }
            other => panic!("expected CycleDetected, got {other}"),
        }
    }

    #[test]
    fn test_require_finalized() {
        let mut g = graph(&["a"], &[]);
        assert!(matches!(
            g.require_finalized("planning"),
            Err(PodplanError::GraphNotFinalized { operation: "planning" })
        ));
        g.finalize().unwrap();
        assert!(g.require_finalized("planning").is_ok());
    }
}
