//! Class hierarchy and virtual-dispatch resolution.
//!
//! Dispatch is resolved the way a JVM-style runtime would, but statically:
//! start at the receiver's concrete class and walk the superclass chain
//! upwards until a class that concretely defines the called sub-signature is
//! found. Interfaces never contribute implementations, only declarations, so
//! the walk only follows superclass links.

use crate::errors::SliceError;
use crate::program::{CallKind, MethodRef};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One class (or interface) as declared by the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub is_interface: bool,
}

/// Superclass chains plus, per class, the sub-signatures it concretely
/// implements. Built once from the program model; read-only afterwards.
#[derive(Debug, Clone)]
pub struct TypeHierarchy {
    classes: BTreeMap<String, ClassDef>,
    implemented: BTreeMap<String, BTreeSet<String>>,
}

impl TypeHierarchy {
    /// Builds the hierarchy and verifies every superclass chain terminates.
    /// `concrete_methods` must list only methods that carry a body.
    pub fn new<'a>(
        classes: Vec<ClassDef>,
        concrete_methods: impl Iterator<Item = &'a MethodRef>,
    ) -> Result<Self, SliceError> {
        let classes: BTreeMap<String, ClassDef> = classes
            .into_iter()
            .map(|c| (c.name.clone(), c))
            .collect();

        let mut implemented: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for method in concrete_methods {
            implemented
                .entry(method.class.clone())
                .or_default()
                .insert(method.sub_signature());
        }

        let hierarchy = Self {
            classes,
            implemented,
        };
        hierarchy.check_acyclic()?;
        Ok(hierarchy)
    }

    fn check_acyclic(&self) -> Result<(), SliceError> {
        for start in self.classes.keys() {
            let mut seen = BTreeSet::new();
            let mut cur = Some(start.as_str());
            while let Some(class) = cur {
                if !seen.insert(class) {
                    return Err(SliceError::MalformedProgram {
                        message: format!("cyclic superclass chain through {class}"),
                    });
                }
                cur = self.superclass_of(class);
            }
        }
        Ok(())
    }

    pub fn superclass_of(&self, class: &str) -> Option<&str> {
        self.classes
            .get(class)
            .and_then(|c| c.superclass.as_deref())
    }

    pub fn is_interface(&self, class: &str) -> bool {
        self.classes.get(class).is_some_and(|c| c.is_interface)
    }

    /// Most-derived override of `signature` visible from `concrete` class.
    /// Returns `None` when no class on the chain implements it (phantom or
    /// abstract-only declaration).
    pub fn resolve_dispatch(&self, concrete: &str, signature: &MethodRef) -> Option<MethodRef> {
        let key = signature.sub_signature();
        let mut cur = Some(concrete);
        while let Some(class) = cur {
            if self
                .implemented
                .get(class)
                .is_some_and(|sigs| sigs.contains(&key))
            {
                return Some(signature.in_class(class));
            }
            cur = self.superclass_of(class);
        }
        None
    }

    /// Resolves one call site to its possible targets. For dynamic kinds
    /// `receiver_classes` is the points-to-derived set of concrete receiver
    /// classes, already deduplicated and deterministically ordered; the
    /// result preserves that order with duplicate targets removed.
    pub fn resolve_call<'a>(
        &self,
        kind: CallKind,
        signature: &MethodRef,
        receiver_classes: impl Iterator<Item = &'a str>,
    ) -> Vec<MethodRef> {
        match kind {
            CallKind::Static | CallKind::Special => self
                .resolve_dispatch(&signature.class, signature)
                .into_iter()
                .collect(),
            CallKind::Virtual | CallKind::Interface => {
                let mut seen = BTreeSet::new();
                let mut targets = Vec::new();
                for class in receiver_classes {
                    if let Some(target) = self.resolve_dispatch(class, signature) {
                        if seen.insert(target.clone()) {
                            targets.push(target);
                        }
                    }
                }
                targets
            }
        }
    }
}
