//! Worklist fixpoint solver for the subset-constraint system.
//!
//! Two propagation strategies share the same least fixpoint: a sequential
//! worklist (small programs) and a round-based parallel join (large
//! programs). The parallel path computes per-node deltas under rayon and
//! applies them sequentially in ascending node order, so the observable
//! result is identical to a sequential run.
//!
//! An outer loop layers call binding on top: after each inner fixpoint,
//! every call site is re-resolved against the current receiver sets and any
//! newly reachable target contributes its parameter/return copy edges. The
//! loop ends when a round binds nothing new.

use crate::points_to::constraints::{self, ConstraintSet, NodeTable, PtNode, RETURN_VAR};
use crate::points_to::{AllocSite, PointsToAnalysis, VarId};
use crate::program::{CallKind, CallSite, MethodRef, ProgramModel};
use dashmap::DashMap;
use log::debug;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};

#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// Allow the round-based rayon propagation path.
    pub parallel: bool,
    /// Minimum node count before the parallel path is worth the overhead.
    pub parallel_threshold: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            parallel: num_cpus::get() > 1,
            parallel_threshold: 4096,
        }
    }
}

/// Solves the program's points-to constraints with default options.
pub fn solve(program: &ProgramModel) -> PointsToAnalysis {
    solve_with(program, SolverOptions::default())
}

pub fn solve_with(program: &ProgramModel, options: SolverOptions) -> PointsToAnalysis {
    let cs = constraints::generate(program);
    let mut state = SolverState::seed(cs);
    let mut bound: HashSet<(usize, MethodRef)> = HashSet::new();

    loop {
        state.propagate(&options);

        let mut grew = false;
        for ordinal in 0..state.invokes.len() {
            let site = state.invokes[ordinal].clone();
            for target in resolve_site(program, &state, &site) {
                if !bound.insert((ordinal, target.clone())) {
                    continue;
                }
                debug!("binding {} -> {}", site.caller, target);
                if state.bind(&site, &target, program) {
                    grew = true;
                }
            }
        }
        if !grew {
            break;
        }
    }

    debug!(
        "points-to fixpoint: {} nodes, {} sites",
        state.nodes.len(),
        state.sites.len()
    );
    state.into_analysis()
}

/// Possible targets of one call site under the current receiver sets.
fn resolve_site(program: &ProgramModel, state: &SolverState, site: &CallSite) -> Vec<MethodRef> {
    let classes: Vec<String> = if site.kind.is_dynamic() {
        site.receiver
            .as_ref()
            .map(|r| state.classes_of_var(&VarId::new(site.caller.clone(), r.clone())))
            .unwrap_or_default()
    } else {
        Vec::new()
    };
    program
        .hierarchy()
        .resolve_call(site.kind, &site.signature, classes.iter().map(String::as_str))
}

struct SolverState {
    nodes: NodeTable,
    sites: Vec<AllocSite>,
    pts: Vec<BTreeSet<usize>>,
    succs: Vec<BTreeSet<usize>>,
    loads_by_recv: BTreeMap<usize, Vec<usize>>,
    stores_by_recv: BTreeMap<usize, Vec<usize>>,
    obj_nodes: BTreeMap<usize, usize>,
    invokes: Vec<CallSite>,
    dirty: BTreeSet<usize>,
}

impl SolverState {
    fn seed(cs: ConstraintSet) -> Self {
        let n = cs.nodes.len();
        let mut state = Self {
            nodes: cs.nodes,
            sites: cs.sites,
            pts: vec![BTreeSet::new(); n],
            succs: vec![BTreeSet::new(); n],
            loads_by_recv: BTreeMap::new(),
            stores_by_recv: BTreeMap::new(),
            obj_nodes: BTreeMap::new(),
            invokes: cs.invokes,
            dirty: BTreeSet::new(),
        };
        for (node, site) in cs.seeds {
            if state.pts[node].insert(site) {
                state.dirty.insert(node);
            }
        }
        for (src, dst) in cs.copies {
            state.add_copy(src, dst);
        }
        for (recv, dst) in cs.loads {
            state.loads_by_recv.entry(recv).or_default().push(dst);
            state.dirty.insert(recv);
        }
        for (value, recv) in cs.stores {
            state.stores_by_recv.entry(recv).or_default().push(value);
            state.dirty.insert(recv);
        }
        state
    }

    fn grow(&mut self) {
        while self.pts.len() < self.nodes.len() {
            self.pts.push(BTreeSet::new());
            self.succs.push(BTreeSet::new());
        }
    }

    fn intern_var(&mut self, var: VarId) -> usize {
        let id = self.nodes.intern(PtNode::Var(var));
        self.grow();
        id
    }

    fn obj_node(&mut self, site: usize) -> usize {
        if let Some(&id) = self.obj_nodes.get(&site) {
            return id;
        }
        let id = self.nodes.intern(PtNode::Obj(site));
        self.grow();
        self.obj_nodes.insert(site, id);
        id
    }

    /// Adds a copy edge; marks the source dirty so the next propagation
    /// pushes its set across. Returns whether the edge is new.
    fn add_copy(&mut self, src: usize, dst: usize) -> bool {
        if src == dst || !self.succs[src].insert(dst) {
            return false;
        }
        self.dirty.insert(src);
        true
    }

    /// Flows pts(src) into pts(dst); returns whether dst changed.
    fn flow(&mut self, src: usize, dst: usize) -> bool {
        if src == dst || self.pts[src].is_empty() {
            return false;
        }
        let src_set = self.pts[src].clone();
        let before = self.pts[dst].len();
        self.pts[dst].extend(src_set);
        self.pts[dst].len() != before
    }

    fn add_edge_and_flow(&mut self, src: usize, dst: usize) -> bool {
        if src != dst {
            self.succs[src].insert(dst);
        }
        self.flow(src, dst)
    }

    fn propagate(&mut self, options: &SolverOptions) {
        if options.parallel && self.nodes.len() >= options.parallel_threshold {
            self.propagate_rounds();
        } else {
            self.propagate_worklist();
        }
    }

    fn propagate_worklist(&mut self) {
        let mut worklist = std::mem::take(&mut self.dirty);
        while let Some(n) = worklist.pop_first() {
            let pset: Vec<usize> = self.pts[n].iter().copied().collect();

            if let Some(dsts) = self.loads_by_recv.get(&n).cloned() {
                for &o in &pset {
                    let obj = self.obj_node(o);
                    for &dst in &dsts {
                        if self.add_edge_and_flow(obj, dst) {
                            worklist.insert(dst);
                        }
                    }
                }
            }
            if let Some(values) = self.stores_by_recv.get(&n).cloned() {
                for &o in &pset {
                    let obj = self.obj_node(o);
                    for &value in &values {
                        if self.add_edge_and_flow(value, obj) {
                            worklist.insert(obj);
                        }
                    }
                }
            }

            let succs: Vec<usize> = self.succs[n].iter().copied().collect();
            for dst in succs {
                if self.flow(n, dst) {
                    worklist.insert(dst);
                }
            }
        }
    }

    /// Round-based propagation: derive load/store edges sequentially, then
    /// join predecessor sets in parallel. Deltas are applied in ascending
    /// node order, keeping the run indistinguishable from sequential.
    fn propagate_rounds(&mut self) {
        self.dirty.clear();
        loop {
            let mut new_edge = false;

            let loads: Vec<(usize, Vec<usize>)> = self
                .loads_by_recv
                .iter()
                .map(|(k, v)| (*k, v.clone()))
                .collect();
            for (recv, dsts) in loads {
                let objs: Vec<usize> = self.pts[recv].iter().copied().collect();
                for o in objs {
                    let obj = self.obj_node(o);
                    for &dst in &dsts {
                        if obj != dst && self.succs[obj].insert(dst) {
                            new_edge = true;
                        }
                    }
                }
            }
            let stores: Vec<(usize, Vec<usize>)> = self
                .stores_by_recv
                .iter()
                .map(|(k, v)| (*k, v.clone()))
                .collect();
            for (recv, values) in stores {
                let objs: Vec<usize> = self.pts[recv].iter().copied().collect();
                for o in objs {
                    let obj = self.obj_node(o);
                    for &value in &values {
                        if value != obj && self.succs[value].insert(obj) {
                            new_edge = true;
                        }
                    }
                }
            }

            let n = self.nodes.len();
            let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
            for (src, dsts) in self.succs.iter().enumerate() {
                for &dst in dsts {
                    preds[dst].push(src);
                }
            }

            let pts = &self.pts;
            let deltas: DashMap<usize, BTreeSet<usize>> = DashMap::new();
            (0..n).into_par_iter().for_each(|dst| {
                let mut delta = BTreeSet::new();
                for &src in &preds[dst] {
                    for &site in &pts[src] {
                        if !pts[dst].contains(&site) {
                            delta.insert(site);
                        }
                    }
                }
                if !delta.is_empty() {
                    deltas.insert(dst, delta);
                }
            });

            let mut changed = false;
            for dst in 0..n {
                if let Some((_, delta)) = deltas.remove(&dst) {
                    self.pts[dst].extend(delta);
                    changed = true;
                }
            }
            if !changed && !new_edge {
                break;
            }
        }
    }

    fn classes_of_var(&self, var: &VarId) -> Vec<String> {
        let Some(id) = self.nodes.lookup(&PtNode::Var(var.clone())) else {
            return Vec::new();
        };
        let mut classes: BTreeSet<String> = BTreeSet::new();
        for &site in &self.pts[id] {
            classes.insert(self.sites[site].class.clone());
        }
        classes.into_iter().collect()
    }

    /// Adds the parameter/return copy edges for one resolved call target.
    /// Returns whether any new edge appeared.
    fn bind(&mut self, site: &CallSite, target: &MethodRef, program: &ProgramModel) -> bool {
        let Some(body) = program.body(target) else {
            return false;
        };
        if body.is_abstract {
            return false;
        }

        let mut grew = false;
        let mut formals = body.params.iter();
        if site.kind != CallKind::Static {
            if let (Some(this_param), Some(recv)) = (formals.next(), site.receiver.as_ref()) {
                let src = self.intern_var(VarId::new(site.caller.clone(), recv.clone()));
                let dst = self.intern_var(VarId::new(target.clone(), this_param.clone()));
                grew |= self.add_copy(src, dst);
            }
        }
        for (arg, param) in site.args.iter().zip(formals) {
            let src = self.intern_var(VarId::new(site.caller.clone(), arg.clone()));
            let dst = self.intern_var(VarId::new(target.clone(), param.clone()));
            grew |= self.add_copy(src, dst);
        }
        if let Some(result) = &site.result {
            let src = self.intern_var(VarId::new(target.clone(), RETURN_VAR));
            let dst = self.intern_var(VarId::new(site.caller.clone(), result.clone()));
            grew |= self.add_copy(src, dst);
        }
        grew
    }

    fn into_analysis(self) -> PointsToAnalysis {
        let mut sets: BTreeMap<VarId, BTreeSet<usize>> = BTreeMap::new();
        for id in 0..self.nodes.len() {
            if let PtNode::Var(var) = self.nodes.node(id) {
                if var.name == RETURN_VAR {
                    continue;
                }
                sets.insert(var.clone(), self.pts[id].clone());
            }
        }
        PointsToAnalysis::new(self.sites, sets)
    }
}
