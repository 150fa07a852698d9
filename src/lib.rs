//! Whole-program call graph construction and calling-context slice
//! extraction.
//!
//! Given a program model exported by an external front end (methods,
//! statement-level bodies, class hierarchy), this crate resolves virtual
//! dispatch through an Andersen-style points-to analysis, builds an
//! immutable call graph, and extracts a bounded, deterministic backward
//! slice around a target method for a downstream consumer.
//!
//! Pipeline: program model -> points-to fixpoint -> call graph -> context
//! slice -> JSON export.

pub mod call_graph;
pub mod cli;
pub mod config;
pub mod errors;
pub mod extractor;
pub mod io;
pub mod points_to;
pub mod program;

// Re-export commonly used types
pub use crate::call_graph::{build, BuildStats, CallGraph, CallGraphEdge, SiteRef};
pub use crate::config::SliceConfig;
pub use crate::errors::SliceError;
pub use crate::extractor::{extract, CallerContext, ContextSlice};
pub use crate::io::{create_writer, OutputFormat, SliceWriter};
pub use crate::points_to::{solve, AllocSite, PointsToAnalysis, VarId};
pub use crate::program::{
    loader::load_program, CallKind, CallSite, MethodBody, MethodRef, ProgramModel, Stmt,
    TypeHierarchy,
};
