//! JSON-IR front-end adapter.
//!
//! The external loader (bytecode reader, compiler plugin, whatever produced
//! the program) exports one JSON document describing classes, method bodies,
//! and entry points. This module deserializes that document and runs the
//! structural validation in [`ProgramModel::new`]; any inconsistency aborts
//! the load with no partial model.

use crate::errors::SliceError;
use crate::program::{ClassDef, MethodBody, MethodRef, ProgramModel, Stmt};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawProgram {
    #[serde(default)]
    classes: Vec<ClassDef>,
    methods: Vec<RawMethod>,
    #[serde(default)]
    entry_points: Vec<MethodRef>,
}

#[derive(Debug, Deserialize)]
struct RawMethod {
    #[serde(rename = "ref")]
    method: MethodRef,
    #[serde(default)]
    params: Vec<String>,
    #[serde(default)]
    body: Vec<Stmt>,
    #[serde(default)]
    is_abstract: bool,
}

/// Loads a program model from a JSON-IR file.
pub fn load_program(path: &Path) -> Result<ProgramModel, SliceError> {
    let text = fs::read_to_string(path)?;
    from_json_str(&text)
}

/// Parses a program model from JSON-IR text.
pub fn from_json_str(text: &str) -> Result<ProgramModel, SliceError> {
    let raw: RawProgram = serde_json::from_str(text)?;

    let mut methods: BTreeMap<MethodRef, MethodBody> = BTreeMap::new();
    for m in raw.methods {
        if m.is_abstract && !m.body.is_empty() {
            return Err(SliceError::MalformedProgram {
                message: format!("abstract method {} carries a body", m.method),
            });
        }
        let previous = methods.insert(
            m.method.clone(),
            MethodBody {
                params: m.params,
                stmts: m.body,
                is_abstract: m.is_abstract,
            },
        );
        if previous.is_some() {
            return Err(SliceError::MalformedProgram {
                message: format!("duplicate method definition {}", m.method),
            });
        }
    }

    ProgramModel::new(raw.classes, methods, raw.entry_points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn loads_minimal_program() {
        let text = indoc! {r#"
            {
              "classes": [
                {"name": "A"},
                {"name": "B", "superclass": "A"}
              ],
              "methods": [
                {
                  "ref": {"class": "A", "name": "run", "ret": "void"},
                  "params": ["this"],
                  "body": [
                    {"op": "alloc", "target": "x", "class": "B"},
                    {"op": "invoke", "kind": "virtual",
                     "signature": {"class": "A", "name": "step", "ret": "void"},
                     "receiver": "x"}
                  ]
                },
                {
                  "ref": {"class": "A", "name": "step", "ret": "void"},
                  "params": ["this"]
                }
              ],
              "entry_points": [{"class": "A", "name": "run", "ret": "void"}]
            }
        "#};

        let program = from_json_str(text).unwrap();
        assert_eq!(program.method_count(), 2);
        assert_eq!(program.entry_points().len(), 1);
        let run = MethodRef::new("A", "run", "void", vec![]);
        assert_eq!(program.call_sites(&run).len(), 1);
        assert_eq!(program.hierarchy().superclass_of("B"), Some("A"));
    }

    #[test]
    fn duplicate_method_fails_the_load() {
        let text = indoc! {r#"
            {
              "methods": [
                {"ref": {"class": "A", "name": "run", "ret": "void"}},
                {"ref": {"class": "A", "name": "run", "ret": "void"}}
              ]
            }
        "#};
        let err = from_json_str(text).unwrap_err();
        assert!(matches!(err, SliceError::MalformedProgram { .. }));
    }

    #[test]
    fn abstract_method_with_body_fails_the_load() {
        let text = indoc! {r#"
            {
              "methods": [
                {
                  "ref": {"class": "I", "name": "go", "ret": "void"},
                  "is_abstract": true,
                  "body": [{"op": "return"}]
                }
              ]
            }
        "#};
        let err = from_json_str(text).unwrap_err();
        assert!(matches!(err, SliceError::MalformedProgram { .. }));
    }

    #[test]
    fn invalid_json_surfaces_as_json_error() {
        assert!(matches!(
            from_json_str("{not json").unwrap_err(),
            SliceError::Json(_)
        ));
    }
}
