//! Whole-program call graph construction.
//!
//! Target-agnostic: the builder never looks at the eventual slice target,
//! so one graph serves arbitrarily many extraction requests. With declared
//! entry points the build walks the reachability closure; without them it
//! conservatively visits every method, maximizing recall.
//!
//! Resolution per call site:
//! - static/special: the declared signature, looked up through the
//!   hierarchy (constructors and super calls land on the defining class).
//! - virtual/interface: the receiver's points-to classes, each dispatched
//!   to its most-derived override; one edge per distinct resolved target,
//!   all sharing the originating site.
//!
//! Unresolvable targets and empty receiver sets are recall limitations, not
//! errors: they are counted, logged, and the build continues.

use crate::call_graph::{CallGraph, SiteRef};
use crate::points_to::{PointsToAnalysis, VarId};
use crate::program::{CallSite, MethodRef, ProgramModel};
use log::{debug, warn};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};

/// Construction statistics, reported at info level and exposed for tests
/// and the `graph` subcommand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub methods_visited: usize,
    pub edges: usize,
    pub phantom_targets: usize,
    pub empty_receiver_sites: usize,
}

/// Builds the call graph for `program` using the solved points-to sets.
pub fn build(program: &ProgramModel, points_to: &PointsToAnalysis) -> (CallGraph, BuildStats) {
    let mut graph = CallGraph::new();
    let mut stats = BuildStats::default();

    if program.entry_points().is_empty() {
        for method in program.methods() {
            stats.methods_visited += 1;
            resolve_method(program, points_to, method, &mut graph, &mut stats);
        }
    } else {
        let mut visited: HashSet<MethodRef> = HashSet::new();
        let mut queue: VecDeque<MethodRef> = VecDeque::new();
        for entry in program.entry_points() {
            if visited.insert(entry.clone()) {
                queue.push_back(entry.clone());
            }
        }
        while let Some(method) = queue.pop_front() {
            stats.methods_visited += 1;
            for target in resolve_method(program, points_to, &method, &mut graph, &mut stats) {
                if visited.insert(target.clone()) {
                    queue.push_back(target);
                }
            }
        }
    }

    stats.edges = graph.edge_count();
    (graph, stats)
}

/// Resolves every call site of one method, adding edges; returns the
/// resolved targets for reachability-driven builds.
fn resolve_method(
    program: &ProgramModel,
    points_to: &PointsToAnalysis,
    method: &MethodRef,
    graph: &mut CallGraph,
    stats: &mut BuildStats,
) -> Vec<MethodRef> {
    let mut discovered = Vec::new();
    for site in program.call_sites(method) {
        for target in resolve_site(program, points_to, &site, stats) {
            graph.add_edge(
                method.clone(),
                target.clone(),
                SiteRef {
                    method: method.clone(),
                    index: site.index,
                },
                site.signature.clone(),
            );
            discovered.push(target);
        }
    }
    discovered
}

fn resolve_site(
    program: &ProgramModel,
    points_to: &PointsToAnalysis,
    site: &CallSite,
    stats: &mut BuildStats,
) -> Vec<MethodRef> {
    let hierarchy = program.hierarchy();

    if !site.kind.is_dynamic() {
        return match hierarchy.resolve_dispatch(&site.signature.class, &site.signature) {
            Some(target) => vec![target],
            None => {
                stats.phantom_targets += 1;
                warn!("phantom call target {} at {}#{}", site.signature, site.caller, site.index);
                Vec::new()
            }
        };
    }

    let classes = site
        .receiver
        .as_ref()
        .map(|r| points_to.classes_of(&VarId::new(site.caller.clone(), r.clone())))
        .unwrap_or_default();
    if classes.is_empty() {
        stats.empty_receiver_sites += 1;
        debug!(
            "empty receiver points-to set at {}#{} ({})",
            site.caller, site.index, site.signature
        );
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut targets = Vec::new();
    for class in classes {
        match hierarchy.resolve_dispatch(class, &site.signature) {
            Some(target) => {
                if seen.insert(target.clone()) {
                    targets.push(target);
                }
            }
            None => {
                stats.phantom_targets += 1;
                debug!(
                    "no override of {} visible from {class} at {}#{}",
                    site.signature, site.caller, site.index
                );
            }
        }
    }
    targets
}
