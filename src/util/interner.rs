//! Identifier interning
//!
//! Task ids and volume identities recur across tasks, edges, handles and
//! hazards. Interning stores each distinct identifier once and hands out
//! `Arc<str>` clones, so graph maps and hazard reports share allocations.
//!
//! The set only grows while identifiers are in use. Processes that load many
//! unrelated workflows call [`release_unused`] once their graphs are dropped.

use std::sync::Arc;

use dashmap::DashSet;
use once_cell::sync::Lazy;

static IDENTIFIERS: Lazy<Interner> = Lazy::new(Interner::new);

/// Thread-safe identifier interner
#[derive(Default)]
pub struct Interner {
    identifiers: DashSet<Arc<str>>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared `Arc<str>` for `s`, inserting it on first use
    pub fn intern(&self, s: &str) -> Arc<str> {
        if let Some(existing) = self.identifiers.get(s) {
            return Arc::clone(existing.key());
        }

        let candidate: Arc<str> = Arc::from(s);
        // Another thread may have inserted between get and insert; keep theirs.
        if !self.identifiers.insert(Arc::clone(&candidate)) {
            if let Some(existing) = self.identifiers.get(s) {
                return Arc::clone(existing.key());
            }
        }
        candidate
    }

    /// Drop identifiers held only by the interner; returns how many were removed
    pub fn release_unused(&self) -> usize {
        let before = self.identifiers.len();
        self.identifiers.retain(|id| Arc::strong_count(id) > 1);
        before.saturating_sub(self.identifiers.len())
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

/// Intern an identifier in the process-wide interner
#[inline]
pub fn intern(s: &str) -> Arc<str> {
    IDENTIFIERS.intern(s)
}

/// Release process-wide identifiers no graph, task or hazard still holds
pub fn release_unused() -> usize {
    IDENTIFIERS.release_unused()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_identifier_shares_allocation() {
        let interner = Interner::new();
        let a = interner.intern("volume_write_task");
        let b = interner.intern("volume_write_task");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn distinct_identifiers_are_distinct() {
        let interner = Interner::new();
        let a = interner.intern("start_task");
        let b = interner.intern("volume_read_task");
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn release_keeps_live_identifiers() {
        let interner = Interner::new();
        let kept = interner.intern("start_task");
        let dropped = interner.intern("volume_read_task");
        drop(dropped);

        assert_eq!(interner.release_unused(), 1);
        assert_eq!(interner.len(), 1);
        assert!(Arc::ptr_eq(&kept, &interner.intern("start_task")));

        drop(kept);
        assert_eq!(interner.release_unused(), 1);
        assert!(interner.is_empty());
    }

    #[test]
    fn release_after_graph_drop_shrinks_set() {
        let interner = Interner::new();
        let ids: Vec<Arc<str>> = (0..1000).map(|i| interner.intern(&format!("t{i}"))).collect();
        assert_eq!(interner.len(), 1000);

        drop(ids);
        assert_eq!(interner.release_unused(), 1000);
        assert!(interner.is_empty());
    }

    #[test]
    fn concurrent_interning_converges() {
        let interner = Arc::new(Interner::new());
        let results: Vec<Arc<str>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let interner = Arc::clone(&interner);
                    scope.spawn(move || interner.intern("shared"))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for r in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], r));
        }
        assert_eq!(interner.len(), 1);
    }
}
