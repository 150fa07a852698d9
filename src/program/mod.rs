//! Read-only program model consumed by the analysis core.
//!
//! The model is produced by an external front end (a bytecode or IR loader)
//! and handed to this crate fully materialized: methods with statement-level
//! bodies, a class hierarchy, and an optional set of entry points. Nothing in
//! this crate mutates it after construction.

pub mod hierarchy;
pub mod loader;

use crate::errors::SliceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub use hierarchy::{ClassDef, TypeHierarchy};

/// Globally unique method identifier: declaring class, name, and full
/// parameter/return signature. Value identity; used as the node key in the
/// call graph and as the target identifier of a slice request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodRef {
    pub class: String,
    pub name: String,
    pub ret: String,
    #[serde(default)]
    pub params: Vec<String>,
}

impl MethodRef {
    pub fn new(
        class: impl Into<String>,
        name: impl Into<String>,
        ret: impl Into<String>,
        params: Vec<String>,
    ) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            ret: ret.into(),
            params,
        }
    }

    /// Signature without the declaring class, the key used for override
    /// lookup in the type hierarchy.
    pub fn sub_signature(&self) -> String {
        format!("{} {}({})", self.ret, self.name, self.params.join(","))
    }

    /// Same signature re-homed on a different declaring class.
    pub fn in_class(&self, class: &str) -> MethodRef {
        MethodRef {
            class: class.to_string(),
            name: self.name.clone(),
            ret: self.ret.clone(),
            params: self.params.clone(),
        }
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}: {} {}({})>",
            self.class,
            self.ret,
            self.name,
            self.params.join(",")
        )
    }
}

impl FromStr for MethodRef {
    type Err = SliceError;

    /// Parses the canonical form `<Class: ret name(p1,p2)>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SliceError::InvalidSignature(s.to_string());
        let inner = s
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
            .ok_or_else(invalid)?;
        let (class, sig) = inner.split_once(": ").ok_or_else(invalid)?;
        let (ret, call) = sig.split_once(' ').ok_or_else(invalid)?;
        let (name, rest) = call.split_once('(').ok_or_else(invalid)?;
        let params_str = rest.strip_suffix(')').ok_or_else(invalid)?;
        if class.is_empty() || ret.is_empty() || name.is_empty() {
            return Err(invalid());
        }
        let params = if params_str.is_empty() {
            Vec::new()
        } else {
            params_str.split(',').map(|p| p.trim().to_string()).collect()
        };
        Ok(MethodRef::new(class, name, ret, params))
    }
}

/// Dispatch discipline of a call expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// Class-level call, no receiver.
    Static,
    /// Constructor or super call; exact target, receiver present.
    Special,
    /// Virtual dispatch on the receiver's concrete class.
    Virtual,
    /// Interface dispatch; resolves like virtual.
    Interface,
}

impl CallKind {
    pub fn is_dynamic(self) -> bool {
        matches!(self, CallKind::Virtual | CallKind::Interface)
    }
}

/// A single statement in a method body. The statement vocabulary is exactly
/// what a flow-insensitive points-to analysis needs: allocations, reference
/// copies, field traffic, calls, and returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Stmt {
    /// `target = new class()`
    Alloc { target: String, class: String },
    /// `target = source`
    Assign { target: String, source: String },
    /// `target = source.field`
    Load {
        target: String,
        source: String,
        field: String,
    },
    /// `target.field = value`
    Store {
        target: String,
        field: String,
        value: String,
    },
    /// A call expression; `declared_type` defaults to the signature's class.
    Invoke {
        kind: CallKind,
        signature: MethodRef,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        declared_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        receiver: Option<String>,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
    },
    /// `return` / `return value`
    Return {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
}

/// A call expression inside a method body, projected out of its `Invoke`
/// statement. `index` is the statement position, the stable ordering key for
/// everything downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub caller: MethodRef,
    pub index: usize,
    pub kind: CallKind,
    pub declared_type: String,
    pub signature: MethodRef,
    pub receiver: Option<String>,
    pub args: Vec<String>,
    pub result: Option<String>,
}

/// Statement-level body of one method. For instance methods the first
/// parameter is the receiver. Abstract methods (interface declarations,
/// abstract class members) carry no statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodBody {
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub stmts: Vec<Stmt>,
    #[serde(default)]
    pub is_abstract: bool,
}

/// The whole program: every method the front end loaded, keyed by signature,
/// plus the class hierarchy and declared entry points. Immutable once
/// constructed; safe to share across threads by reference.
#[derive(Debug, Clone)]
pub struct ProgramModel {
    methods: BTreeMap<MethodRef, MethodBody>,
    hierarchy: TypeHierarchy,
    entry_points: Vec<MethodRef>,
}

impl ProgramModel {
    /// Assembles and validates a program model. Structural inconsistencies
    /// (cyclic superclass chains, instance calls without a receiver, entry
    /// points the program does not define) abort construction; there is no
    /// partially valid model.
    pub fn new(
        classes: Vec<ClassDef>,
        methods: BTreeMap<MethodRef, MethodBody>,
        entry_points: Vec<MethodRef>,
    ) -> Result<Self, SliceError> {
        let concrete = methods
            .iter()
            .filter(|(_, body)| !body.is_abstract)
            .map(|(m, _)| m);
        let hierarchy = TypeHierarchy::new(classes, concrete)?;

        for (method, body) in &methods {
            for (index, stmt) in body.stmts.iter().enumerate() {
                if let Stmt::Invoke { kind, receiver, .. } = stmt {
                    if *kind != CallKind::Static && receiver.is_none() {
                        return Err(SliceError::MalformedProgram {
                            message: format!(
                                "instance call at {method}#{index} has no receiver"
                            ),
                        });
                    }
                }
            }
        }

        for entry in &entry_points {
            if !methods.contains_key(entry) {
                return Err(SliceError::MalformedProgram {
                    message: format!("entry point {entry} is not defined"),
                });
            }
        }

        Ok(Self {
            methods,
            hierarchy,
            entry_points,
        })
    }

    /// Replaces the declared entry points, e.g. from CLI flags.
    pub fn with_entry_points(mut self, entry_points: Vec<MethodRef>) -> Result<Self, SliceError> {
        for entry in &entry_points {
            if !self.methods.contains_key(entry) {
                return Err(SliceError::MalformedProgram {
                    message: format!("entry point {entry} is not defined"),
                });
            }
        }
        self.entry_points = entry_points;
        Ok(self)
    }

    /// All methods in deterministic (sorted) order.
    pub fn methods(&self) -> impl Iterator<Item = &MethodRef> {
        self.methods.keys()
    }

    pub fn defines(&self, method: &MethodRef) -> bool {
        self.methods.contains_key(method)
    }

    pub fn body(&self, method: &MethodRef) -> Option<&MethodBody> {
        self.methods.get(method)
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Call sites of one method, in statement order.
    pub fn call_sites(&self, method: &MethodRef) -> Vec<CallSite> {
        let Some(body) = self.methods.get(method) else {
            return Vec::new();
        };
        body.stmts
            .iter()
            .enumerate()
            .filter_map(|(index, stmt)| match stmt {
                Stmt::Invoke {
                    kind,
                    signature,
                    declared_type,
                    receiver,
                    args,
                    result,
                } => Some(CallSite {
                    caller: method.clone(),
                    index,
                    kind: *kind,
                    declared_type: declared_type
                        .clone()
                        .unwrap_or_else(|| signature.class.clone()),
                    signature: signature.clone(),
                    receiver: receiver.clone(),
                    args: args.clone(),
                    result: result.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    pub fn hierarchy(&self) -> &TypeHierarchy {
        &self.hierarchy
    }

    pub fn entry_points(&self) -> &[MethodRef] {
        &self.entry_points
    }
}
