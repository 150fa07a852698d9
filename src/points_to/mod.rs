//! Flow- and context-insensitive points-to analysis.
//!
//! Andersen-style subset constraints, field-insensitive: every allocation
//! site carries a single field summary shared by all of its fields. The
//! solver iterates to the unique least fixpoint, binding call parameters on
//! the fly as receiver sets grow, so virtual call targets discovered late
//! still contribute their constraints.
//!
//! The result is immutable once `solve` returns and every iteration order
//! exposed here is deterministic (sorted sets, stable site ids).

mod constraints;
mod solver;

pub use solver::{solve, solve_with, SolverOptions};

use crate::program::MethodRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One abstract heap object: the allocation statement that creates it,
/// tagged with the concrete class allocated there.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AllocSite {
    pub method: MethodRef,
    pub index: usize,
    pub class: String,
}

impl fmt::Display for AllocSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}:new {}", self.method, self.index, self.class)
    }
}

/// A method-scoped variable occurrence. Parameters and locals share the
/// namespace; the synthetic return variable is interned under a reserved
/// name by the solver.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId {
    pub method: MethodRef,
    pub name: String,
}

impl VarId {
    pub fn new(method: MethodRef, name: impl Into<String>) -> Self {
        Self {
            method,
            name: name.into(),
        }
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}${}", self.method, self.name)
    }
}

/// The solved analysis: per variable, the set of allocation sites it may
/// refer to at runtime. Read-only.
#[derive(Debug, Clone)]
pub struct PointsToAnalysis {
    sites: Vec<AllocSite>,
    sets: BTreeMap<VarId, BTreeSet<usize>>,
}

impl PointsToAnalysis {
    pub(crate) fn new(sites: Vec<AllocSite>, sets: BTreeMap<VarId, BTreeSet<usize>>) -> Self {
        Self { sites, sets }
    }

    /// Allocation sites `var` may point to, in stable site-id order. A
    /// variable the analysis never saw yields an empty set, not an error.
    pub fn points_to(&self, var: &VarId) -> Vec<&AllocSite> {
        self.sets
            .get(var)
            .map(|set| set.iter().map(|&id| &self.sites[id]).collect())
            .unwrap_or_default()
    }

    /// Distinct concrete classes `var` may point to, sorted.
    pub fn classes_of(&self, var: &VarId) -> Vec<&str> {
        let mut classes: BTreeSet<&str> = BTreeSet::new();
        if let Some(set) = self.sets.get(var) {
            for &id in set {
                classes.insert(self.sites[id].class.as_str());
            }
        }
        classes.into_iter().collect()
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    pub fn var_count(&self) -> usize {
        self.sets.len()
    }
}
