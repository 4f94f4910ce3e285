//! Python binding functions: one parser entry point per base operator with
//! every overload's signature, plus the method table.
//!
//! Bindings cover the whole registry; selection does not apply here.

use crate::Result;
use crate::codegen::file_manager::FileManager;
use crate::codegen::template::{CodeTemplate, Env};
use crate::decl::{Declarations, OperatorRecord};

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, instrument};

pub const PYTHON_FUNCTIONS_FILE: &str = "python_functions.cpp";

const PYTHON_FUNCTIONS: CodeTemplate = CodeTemplate::new(
    PYTHON_FUNCTIONS_FILE,
    r#"// @generated by generate-code from the operator declarations

#include "torch/csrc/autograd/python_functions.h"

namespace torch { namespace autograd {

${py_methods}

static PyMethodDef torch_functions[] = {
  ${py_method_defs}
  {nullptr, nullptr, 0, nullptr}
};

PyMethodDef* python_functions() {
  return torch_functions;
}

}} // namespace torch::autograd
"#,
);

const PY_METHOD: CodeTemplate = CodeTemplate::new(
    "py_method",
    r#"// ${name}
static PyObject * THPVariable_${name}(PyObject* self_, PyObject* args, PyObject* kwargs)
{
  HANDLE_TH_ERRORS
  static PythonArgParser parser({
    ${signatures}
  });
  ParsedArgs<${max_args}> parsed_args;
  auto _r = parser.parse(args, kwargs, parsed_args);
  switch (_r.idx) {
    ${dispatch_cases}
  }
  Py_RETURN_NONE;
  END_HANDLE_TH_ERRORS
}
"#,
);

#[instrument(skip_all, fields(out = %out_dir.display()))]
pub fn gen_python_bindings(decls: &Declarations, out_dir: &Path) -> Result<()> {
    let mut groups: BTreeMap<&str, Vec<&OperatorRecord>> = BTreeMap::new();
    for rec in decls.iter().filter(|r| r.is_namespace_function()) {
        groups.entry(rec.name.as_str()).or_default().push(rec);
    }

    let mut py_methods = Vec::with_capacity(groups.len());
    let mut py_method_defs = Vec::with_capacity(groups.len());
    for (name, overloads) in &groups {
        py_methods.push(emit_method(name, overloads)?);
        py_method_defs.push(format!(
            "{{\"{name}\", castPyCFunctionWithKeywords(THPVariable_{name}), \
             METH_VARARGS | METH_KEYWORDS | METH_STATIC, nullptr}},"
        ));
    }

    let mut env = Env::new();
    env.insert("py_methods", py_methods.into());
    env.insert("py_method_defs", py_method_defs.into());
    let text = PYTHON_FUNCTIONS.substitute(&env)?;
    FileManager::new(out_dir).write(PYTHON_FUNCTIONS_FILE, &text)?;

    info!(functions = groups.len(), "generated python bindings");
    Ok(())
}

fn emit_method(name: &str, overloads: &[&OperatorRecord]) -> Result<String> {
    let mut signatures = Vec::with_capacity(overloads.len());
    let mut dispatch_cases = Vec::with_capacity(overloads.len());
    for (idx, rec) in overloads.iter().enumerate() {
        signatures.push(format!("{},", serde_json::to_string(&rec.python_signature())?));
        dispatch_cases.push(format!(
            "case {}: return wrap(dispatch_{}(_r));",
            idx,
            rec.ident()
        ));
    }
    let max_args = overloads
        .iter()
        .map(|r| r.arguments.len())
        .max()
        .unwrap_or(0);

    let mut env = Env::new();
    env.insert("name", name.into());
    env.insert("signatures", signatures.into());
    env.insert("max_args", max_args.to_string().into());
    env.insert("dispatch_cases", dispatch_cases.into());
    PY_METHOD.substitute(&env)
}
