//! Subset-constraint generation from method bodies.
//!
//! Each statement contributes at most one constraint. Invoke statements are
//! collected as-is; their parameter-binding copy edges depend on call-target
//! resolution and are added by the solver's outer loop.

use crate::points_to::{AllocSite, VarId};
use crate::program::{CallSite, ProgramModel, Stmt};
use std::collections::BTreeMap;

/// Reserved variable name carrying a method's returned reference.
pub(crate) const RETURN_VAR: &str = "@return";

/// Solver graph node: a program variable or an allocation site's field
/// summary (field-insensitive, one summary per abstract object).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum PtNode {
    Var(VarId),
    Obj(usize),
}

/// Interning table mapping nodes to dense ids.
#[derive(Debug, Default)]
pub(crate) struct NodeTable {
    ids: BTreeMap<PtNode, usize>,
    nodes: Vec<PtNode>,
}

impl NodeTable {
    pub fn intern(&mut self, node: PtNode) -> usize {
        if let Some(&id) = self.ids.get(&node) {
            return id;
        }
        let id = self.nodes.len();
        self.ids.insert(node.clone(), id);
        self.nodes.push(node);
        id
    }

    pub fn lookup(&self, node: &PtNode) -> Option<usize> {
        self.ids.get(node).copied()
    }

    pub fn node(&self, id: usize) -> &PtNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// Everything the solver starts from.
#[derive(Debug, Default)]
pub(crate) struct ConstraintSet {
    pub nodes: NodeTable,
    pub sites: Vec<AllocSite>,
    /// (node, site): site is in the initial points-to set of node.
    pub seeds: Vec<(usize, usize)>,
    /// (src, dst): pts(src) ⊆ pts(dst).
    pub copies: Vec<(usize, usize)>,
    /// (recv, dst): for each object o in pts(recv), summary(o) ⊆ pts(dst).
    pub loads: Vec<(usize, usize)>,
    /// (value, recv): for each object o in pts(recv), pts(value) ⊆ summary(o).
    pub stores: Vec<(usize, usize)>,
    /// Call sites, in deterministic (method, statement) order.
    pub invokes: Vec<CallSite>,
}

pub(crate) fn generate(program: &ProgramModel) -> ConstraintSet {
    let mut cs = ConstraintSet::default();

    for method in program.methods() {
        let body = match program.body(method) {
            Some(b) => b,
            None => continue,
        };
        let ret = cs
            .nodes
            .intern(PtNode::Var(VarId::new(method.clone(), RETURN_VAR)));
        for (index, stmt) in body.stmts.iter().enumerate() {
            match stmt {
                Stmt::Alloc { target, class } => {
                    let site = cs.sites.len();
                    cs.sites.push(AllocSite {
                        method: method.clone(),
                        index,
                        class: class.clone(),
                    });
                    let t = cs
                        .nodes
                        .intern(PtNode::Var(VarId::new(method.clone(), target.as_str())));
                    cs.seeds.push((t, site));
                }
                Stmt::Assign { target, source } => {
                    let s = cs
                        .nodes
                        .intern(PtNode::Var(VarId::new(method.clone(), source.as_str())));
                    let t = cs
                        .nodes
                        .intern(PtNode::Var(VarId::new(method.clone(), target.as_str())));
                    cs.copies.push((s, t));
                }
                Stmt::Load { target, source, .. } => {
                    let recv = cs
                        .nodes
                        .intern(PtNode::Var(VarId::new(method.clone(), source.as_str())));
                    let t = cs
                        .nodes
                        .intern(PtNode::Var(VarId::new(method.clone(), target.as_str())));
                    cs.loads.push((recv, t));
                }
                Stmt::Store { target, value, .. } => {
                    let v = cs
                        .nodes
                        .intern(PtNode::Var(VarId::new(method.clone(), value.as_str())));
                    let recv = cs
                        .nodes
                        .intern(PtNode::Var(VarId::new(method.clone(), target.as_str())));
                    cs.stores.push((v, recv));
                }
                Stmt::Invoke { .. } => {}
                Stmt::Return { value: Some(v) } => {
                    let s = cs.nodes.intern(PtNode::Var(VarId::new(method.clone(), v.as_str())));
                    cs.copies.push((s, ret));
                }
                Stmt::Return { value: None } => {}
            }
        }
        cs.invokes.extend(program.call_sites(method));
    }

    cs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{MethodBody, MethodRef};
    use std::collections::BTreeMap;

    #[test]
    fn statements_map_to_constraints() {
        let m = MethodRef::new("A", "run", "void", vec![]);
        let mut methods = BTreeMap::new();
        methods.insert(
            m.clone(),
            MethodBody {
                params: vec![],
                stmts: vec![
                    Stmt::Alloc {
                        target: "a".into(),
                        class: "B".into(),
                    },
                    Stmt::Assign {
                        target: "b".into(),
                        source: "a".into(),
                    },
                    Stmt::Store {
                        target: "b".into(),
                        field: "f".into(),
                        value: "a".into(),
                    },
                    Stmt::Load {
                        target: "c".into(),
                        source: "b".into(),
                        field: "f".into(),
                    },
                    Stmt::Return {
                        value: Some("c".into()),
                    },
                ],
                is_abstract: false,
            },
        );
        let program = ProgramModel::new(vec![], methods, vec![]).unwrap();
        let cs = generate(&program);

        assert_eq!(cs.sites.len(), 1);
        assert_eq!(cs.seeds.len(), 1);
        assert_eq!(cs.copies.len(), 2); // assign + return
        assert_eq!(cs.loads.len(), 1);
        assert_eq!(cs.stores.len(), 1);
        assert!(cs.invokes.is_empty());
    }

    #[test]
    fn interning_is_stable() {
        let m = MethodRef::new("A", "run", "void", vec![]);
        let mut table = NodeTable::default();
        let a = table.intern(PtNode::Var(VarId::new(m.clone(), "x")));
        let b = table.intern(PtNode::Var(VarId::new(m.clone(), "x")));
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(&PtNode::Var(VarId::new(m, "x"))), Some(a));
    }
}
