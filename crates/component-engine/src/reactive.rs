//! Dependency graph between reactive sources (contexts) and the component
//! instances that read them during their last render.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use crate::runtime::UpdateTarget;

pub type SourceId = u64;

thread_local! {
    static GRAPH: RefCell<DepGraph> = RefCell::new(DepGraph::default());
}

#[derive(Default)]
struct DepGraph {
    next_source: SourceId,
    // source -> instances that read it
    edges: HashMap<SourceId, HashSet<UpdateTarget>>,
    // instance -> sources it read
    back: HashMap<UpdateTarget, HashSet<SourceId>>,
}

impl DepGraph {
    fn remove_all_edges_for(&mut self, target: &UpdateTarget) {
        if let Some(sources) = self.back.remove(target) {
            for s in sources {
                if let Some(set) = self.edges.get_mut(&s) {
                    set.remove(target);
                    if set.is_empty() {
                        self.edges.remove(&s);
                    }
                }
            }
        }
    }
}

pub fn new_source() -> SourceId {
    GRAPH.with(|g| {
        let mut g = g.borrow_mut();
        let id = g.next_source;
        g.next_source += 1;
        id
    })
}

pub(crate) fn register_read(source: SourceId, target: &UpdateTarget) {
    GRAPH.with(|g| {
        let mut g = g.borrow_mut();
        g.edges.entry(source).or_default().insert(target.clone());
        g.back.entry(target.clone()).or_default().insert(source);
    });
}

/// Drops every edge recorded for `target`. Called before each render so only
/// the reads of the latest render count, and on unmount.
pub(crate) fn clear_dependencies(target: &UpdateTarget) {
    // try_with: runtimes may be dropped during thread-local teardown.
    let _ = GRAPH.try_with(|g| g.borrow_mut().remove_all_edges_for(target));
}

/// Schedules every dependent of `source`. Returns how many were scheduled.
pub fn source_changed(source: SourceId) -> usize {
    let targets: Vec<UpdateTarget> = GRAPH.with(|g| {
        g.borrow()
            .edges
            .get(&source)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    });

    let mut scheduled = 0;
    let mut dead = Vec::new();
    for t in targets {
        if t.schedule() {
            scheduled += 1;
        } else {
            dead.push(t);
        }
    }
    if !dead.is_empty() {
        GRAPH.with(|g| {
            let mut g = g.borrow_mut();
            for t in &dead {
                g.remove_all_edges_for(t);
            }
        });
    }
    scheduled
}

pub fn forget_source(source: SourceId) {
    let _ = GRAPH.try_with(|g| {
        let mut g = g.borrow_mut();
        if let Some(targets) = g.edges.remove(&source) {
            for t in targets {
                if let Some(set) = g.back.get_mut(&t) {
                    set.remove(&source);
                    if set.is_empty() {
                        g.back.remove(&t);
                    }
                }
            }
        }
    });
}

pub fn dependent_count(source: SourceId) -> usize {
    GRAPH.with(|g| g.borrow().edges.get(&source).map_or(0, HashSet::len))
}
