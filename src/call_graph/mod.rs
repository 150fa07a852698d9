//! Call graph: methods as nodes, resolved call relationships as edges.
//!
//! Built exactly once per program snapshot and immutable afterwards; every
//! query is a pure read, so concurrent extraction requests share the graph
//! freely. Edge ids are assigned in construction order, which is the
//! deterministic ordering key for traversal.

mod builder;

pub use builder::{build, BuildStats};

use crate::program::MethodRef;
use im::{HashMap, HashSet, Vector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Reference to one call expression: the enclosing method plus the
/// statement index of the invoke.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SiteRef {
    pub method: MethodRef,
    pub index: usize,
}

impl fmt::Display for SiteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.method, self.index)
    }
}

/// One resolved call relationship. Virtual dispatch fan-out produces several
/// edges sharing the same `site`; `declared` is the statically declared
/// target signature at that site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallGraphEdge {
    pub caller: MethodRef,
    pub callee: MethodRef,
    pub site: SiteRef,
    pub declared: MethodRef,
}

/// Adjacency for one method: edge ids in insertion order.
#[derive(Debug, Clone)]
pub struct CallGraphNode {
    pub id: MethodRef,
    incoming: Vector<usize>,
    outgoing: Vector<usize>,
}

impl CallGraphNode {
    fn new(id: MethodRef) -> Self {
        Self {
            id,
            incoming: Vector::new(),
            outgoing: Vector::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    nodes: HashMap<MethodRef, CallGraphNode>,
    edges: Vector<CallGraphEdge>,
    /// Edges indexed by the site's statically declared signature, so a
    /// slice request for an abstract/interface method still finds the
    /// callers whose sites dispatch through it.
    declared_index: HashMap<MethodRef, Vector<usize>>,
    seen: HashSet<(MethodRef, SiteRef)>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one resolved edge. Idempotent: re-adding the same (callee, site)
    /// pair is a no-op, so rebuilding from the same inputs yields the same
    /// edge set.
    pub fn add_edge(
        &mut self,
        caller: MethodRef,
        callee: MethodRef,
        site: SiteRef,
        declared: MethodRef,
    ) -> bool {
        let key = (callee.clone(), site.clone());
        if self.seen.contains(&key) {
            return false;
        }
        self.seen.insert(key);

        let id = self.edges.len();
        self.edges.push_back(CallGraphEdge {
            caller: caller.clone(),
            callee: callee.clone(),
            site,
            declared: declared.clone(),
        });

        self.ensure_node(&caller);
        if let Some(node) = self.nodes.get_mut(&caller) {
            node.outgoing.push_back(id);
        }
        self.ensure_node(&callee);
        if let Some(node) = self.nodes.get_mut(&callee) {
            node.incoming.push_back(id);
        }
        if declared != callee {
            self.declared_index
                .entry(declared)
                .or_default()
                .push_back(id);
        }
        true
    }

    fn ensure_node(&mut self, id: &MethodRef) {
        if !self.nodes.contains_key(id) {
            self.nodes.insert(id.clone(), CallGraphNode::new(id.clone()));
        }
    }

    pub fn contains(&self, method: &MethodRef) -> bool {
        self.nodes.contains_key(method) || self.declared_index.contains_key(method)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge(&self, id: usize) -> &CallGraphEdge {
        &self.edges[id]
    }

    /// Edges into `method`: direct incoming edges plus edges whose site
    /// statically declares `method` as its target, merged in construction
    /// order with duplicates removed.
    pub fn incoming_edges(&self, method: &MethodRef) -> Vec<&CallGraphEdge> {
        let mut ids: BTreeSet<usize> = BTreeSet::new();
        if let Some(node) = self.nodes.get(method) {
            ids.extend(node.incoming.iter().copied());
        }
        if let Some(declared) = self.declared_index.get(method) {
            ids.extend(declared.iter().copied());
        }
        ids.into_iter().map(|id| &self.edges[id]).collect()
    }

    pub fn outgoing_edges(&self, method: &MethodRef) -> Vec<&CallGraphEdge> {
        self.nodes
            .get(method)
            .map(|node| node.outgoing.iter().map(|&id| &self.edges[id]).collect())
            .unwrap_or_default()
    }

    /// Distinct callers of `method`, in edge discovery order.
    pub fn callers_of(&self, method: &MethodRef) -> Vec<MethodRef> {
        let mut seen = BTreeSet::new();
        let mut callers = Vec::new();
        for edge in self.incoming_edges(method) {
            if seen.insert(&edge.caller) {
                callers.push(edge.caller.clone());
            }
        }
        callers
    }

    /// Distinct callees of `method`, in edge discovery order.
    pub fn callees_of(&self, method: &MethodRef) -> Vec<MethodRef> {
        let mut seen = BTreeSet::new();
        let mut callees = Vec::new();
        for edge in self.outgoing_edges(method) {
            if seen.insert(&edge.callee) {
                callees.push(edge.callee.clone());
            }
        }
        callees
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mref(class: &str, name: &str) -> MethodRef {
        MethodRef::new(class, name, "void", vec![])
    }

    fn site(class: &str, name: &str, index: usize) -> SiteRef {
        SiteRef {
            method: mref(class, name),
            index,
        }
    }

    #[test]
    fn add_edge_is_idempotent() {
        let mut g = CallGraph::new();
        let s = site("A", "run", 0);
        assert!(g.add_edge(mref("A", "run"), mref("B", "go"), s.clone(), mref("B", "go")));
        assert!(!g.add_edge(mref("A", "run"), mref("B", "go"), s, mref("B", "go")));
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn fan_out_shares_the_site() {
        let mut g = CallGraph::new();
        let declared = mref("Base", "go");
        let s = site("A", "run", 3);
        g.add_edge(mref("A", "run"), mref("Left", "go"), s.clone(), declared.clone());
        g.add_edge(mref("A", "run"), mref("Right", "go"), s, declared.clone());
        assert_eq!(g.edge_count(), 2);
        // Both edges are reachable through the declared signature.
        assert_eq!(g.incoming_edges(&declared).len(), 2);
        assert_eq!(g.callers_of(&declared), vec![mref("A", "run")]);
    }

    #[test]
    fn callers_preserve_discovery_order() {
        let mut g = CallGraph::new();
        let callee = mref("Z", "sink");
        g.add_edge(mref("B", "second"), callee.clone(), site("B", "second", 0), callee.clone());
        g.add_edge(mref("A", "first"), callee.clone(), site("A", "first", 0), callee.clone());
        g.add_edge(mref("B", "second"), callee.clone(), site("B", "second", 7), callee.clone());
        assert_eq!(
            g.callers_of(&callee),
            vec![mref("B", "second"), mref("A", "first")]
        );
    }

    #[test]
    fn absent_method_has_no_edges() {
        let g = CallGraph::new();
        assert!(g.incoming_edges(&mref("A", "nope")).is_empty());
        assert!(!g.contains(&mref("A", "nope")));
    }
}
