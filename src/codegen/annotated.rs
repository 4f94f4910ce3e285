//! Annotated function-argument metadata for Python-side test generation.
//!
//! The table is serialized with serde_json and embedded as a Python literal;
//! every leaf is a string, so the JSON is valid Python as-is.

use crate::Result;
use crate::codegen::file_manager::FileManager;
use crate::codegen::template::{CodeTemplate, Env};
use crate::decl::{Declarations, OperatorRecord};

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, instrument};

pub const ANNOTATED_FN_ARGS_FILE: &str = "annotated_fn_args.py";

const ANNOTATED_FN_ARGS: CodeTemplate = CodeTemplate::new(
    ANNOTATED_FN_ARGS_FILE,
    r#""""
Argument annotations for every namespace function, keyed by base name.
One entry per overload.
"""
# @generated by generate-code from the operator declarations

annotated_args = ${annotated_args}
"#,
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedOverload {
    pub overload: String,
    pub args: Vec<AnnotatedArg>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedArg {
    pub name: String,
    pub simple_type: String,
    pub is_kwarg_only: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Metadata table: base name -> overloads, in declaration order.
pub fn annotate(decls: &Declarations) -> BTreeMap<String, Vec<AnnotatedOverload>> {
    let mut table: BTreeMap<String, Vec<AnnotatedOverload>> = BTreeMap::new();
    for rec in decls.iter().filter(|r| r.is_namespace_function()) {
        table
            .entry(rec.name.clone())
            .or_default()
            .push(annotate_overload(rec));
    }
    table
}

fn annotate_overload(rec: &OperatorRecord) -> AnnotatedOverload {
    AnnotatedOverload {
        overload: rec.overload_name.clone().unwrap_or_default(),
        args: rec
            .arguments
            .iter()
            .map(|a| AnnotatedArg {
                name: a.name.clone(),
                simple_type: a.dynamic_type.clone(),
                is_kwarg_only: if a.kwarg_only { "True" } else { "False" }.to_string(),
                default: a.default.clone(),
            })
            .collect(),
    }
}

#[instrument(skip_all, fields(out = %out_dir.display()))]
pub fn gen_annotated(decls: &Declarations, out_dir: &Path) -> Result<()> {
    let table = annotate(decls);
    let json = serde_json::to_string_pretty(&table)?;

    let mut env = Env::new();
    env.insert("annotated_args", json.into());
    let text = ANNOTATED_FN_ARGS.substitute(&env)?;
    FileManager::new(out_dir).write(ANNOTATED_FN_ARGS_FILE, &text)?;

    info!(functions = table.len(), "generated annotated fn args");
    Ok(())
}
