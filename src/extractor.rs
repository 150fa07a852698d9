//! Bounded backward traversal from a target method to its calling context.
//!
//! Breadth-first over incoming edges, depth 1 = direct callers. A method is
//! expanded at most once regardless of how many edges reach it, so cyclic
//! and self-recursive call relationships terminate; a self-call still lists
//! the method once as its own caller. Traversal order is the edge insertion
//! order fixed at graph construction, making the output reproducible for a
//! fixed graph.

use crate::call_graph::{CallGraph, SiteRef};
use crate::errors::SliceError;
use crate::program::{MethodRef, ProgramModel};
use std::collections::{HashMap, HashSet, VecDeque};

/// One discovered caller: the hop distance from the target and the call
/// sites that tie it into the context (the inter-procedural guards).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub method: MethodRef,
    pub depth: u32,
    pub sites: Vec<SiteRef>,
}

/// The extracted slice: the target plus its deduplicated callers in
/// traversal order. Immutable; owned by the requester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSlice {
    pub target: MethodRef,
    pub callers: Vec<CallerContext>,
}

impl ContextSlice {
    /// Caller signatures in traversal order, the minimal interchange shape.
    pub fn caller_signatures(&self) -> Vec<String> {
        self.callers.iter().map(|c| c.method.to_string()).collect()
    }
}

/// Extracts the calling context of `target`, bounded by `max_depth` hops.
///
/// A target the program does not define at all is a typed failure; a target
/// that exists but was never called yields an empty caller sequence.
pub fn extract(
    graph: &CallGraph,
    program: &ProgramModel,
    target: &MethodRef,
    max_depth: u32,
) -> Result<ContextSlice, SliceError> {
    if !program.defines(target) {
        return Err(SliceError::UnresolvedTarget(target.clone()));
    }

    let mut callers: Vec<CallerContext> = Vec::new();
    let mut index_of: HashMap<MethodRef, usize> = HashMap::new();
    let mut visited: HashSet<MethodRef> = HashSet::new();
    visited.insert(target.clone());
    let mut queue: VecDeque<(MethodRef, u32)> = VecDeque::new();
    queue.push_back((target.clone(), 0));

    while let Some((method, depth)) = queue.pop_front() {
        if depth == max_depth {
            continue;
        }
        for edge in graph.incoming_edges(&method) {
            match index_of.get(&edge.caller) {
                Some(&i) => {
                    if !callers[i].sites.contains(&edge.site) {
                        callers[i].sites.push(edge.site.clone());
                    }
                }
                None => {
                    index_of.insert(edge.caller.clone(), callers.len());
                    callers.push(CallerContext {
                        method: edge.caller.clone(),
                        depth: depth + 1,
                        sites: vec![edge.site.clone()],
                    });
                }
            }
            if visited.insert(edge.caller.clone()) {
                queue.push_back((edge.caller.clone(), depth + 1));
            }
        }
    }

    Ok(ContextSlice {
        target: target.clone(),
        callers,
    })
}
