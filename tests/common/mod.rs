#![allow(dead_code)]

use context_slicer::program::{CallKind, ClassDef, MethodBody, MethodRef, ProgramModel, Stmt};
use std::collections::BTreeMap;

/// Fluent fixture builder for in-memory program models.
pub struct ProgramBuilder {
    classes: Vec<ClassDef>,
    methods: BTreeMap<MethodRef, MethodBody>,
    entry_points: Vec<MethodRef>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self {
            classes: Vec::new(),
            methods: BTreeMap::new(),
            entry_points: Vec::new(),
        }
    }

    pub fn class(mut self, name: &str, superclass: Option<&str>) -> Self {
        self.classes.push(ClassDef {
            name: name.to_string(),
            superclass: superclass.map(str::to_string),
            interfaces: vec![],
            is_interface: false,
        });
        self
    }

    pub fn interface(mut self, name: &str) -> Self {
        self.classes.push(ClassDef {
            name: name.to_string(),
            superclass: None,
            interfaces: vec![],
            is_interface: true,
        });
        self
    }

    pub fn implementor(mut self, name: &str, interface: &str) -> Self {
        self.classes.push(ClassDef {
            name: name.to_string(),
            superclass: None,
            interfaces: vec![interface.to_string()],
            is_interface: false,
        });
        self
    }

    pub fn method(mut self, m: MethodRef, params: &[&str], stmts: Vec<Stmt>) -> Self {
        self.methods.insert(
            m,
            MethodBody {
                params: params.iter().map(|p| p.to_string()).collect(),
                stmts,
                is_abstract: false,
            },
        );
        self
    }

    pub fn abstract_method(mut self, m: MethodRef) -> Self {
        self.methods.insert(
            m,
            MethodBody {
                params: vec![],
                stmts: vec![],
                is_abstract: true,
            },
        );
        self
    }

    pub fn entry(mut self, m: MethodRef) -> Self {
        self.entry_points.push(m);
        self
    }

    pub fn build(self) -> ProgramModel {
        ProgramModel::new(self.classes, self.methods, self.entry_points)
            .expect("fixture program should be well-formed")
    }
}

pub fn mref(class: &str, name: &str) -> MethodRef {
    MethodRef::new(class, name, "void", vec![])
}

pub fn alloc(target: &str, class: &str) -> Stmt {
    Stmt::Alloc {
        target: target.to_string(),
        class: class.to_string(),
    }
}

pub fn vcall(signature: MethodRef, receiver: &str) -> Stmt {
    Stmt::Invoke {
        kind: CallKind::Virtual,
        signature,
        declared_type: None,
        receiver: Some(receiver.to_string()),
        args: vec![],
        result: None,
    }
}

pub fn icall(signature: MethodRef, receiver: &str) -> Stmt {
    Stmt::Invoke {
        kind: CallKind::Interface,
        signature,
        declared_type: None,
        receiver: Some(receiver.to_string()),
        args: vec![],
        result: None,
    }
}

pub fn scall(signature: MethodRef) -> Stmt {
    Stmt::Invoke {
        kind: CallKind::Static,
        signature,
        declared_type: None,
        receiver: None,
        args: vec![],
        result: None,
    }
}
