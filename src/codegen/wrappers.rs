//! Unboxing dispatch wrappers.
//!
//! Each declaration ends up as one of:
//! - a full wrapper (selected root operator), guarded against autograd when
//!   autograd is disabled or the operator is not kept for training;
//! - a schema-only registration (excluded, but schema registration forced);
//! - nothing.

use crate::Result;
use crate::codegen::file_manager::FileManager;
use crate::codegen::template::{CodeTemplate, Env};
use crate::decl::{Declarations, OperatorRecord};
use crate::select::OperatorSelector;

use std::path::Path;
use tracing::{debug, info, instrument};

pub const UNBOXING_WRAPPERS_FILE: &str = "generated_unboxing_wrappers.cpp";

const AUTOGRAD_GUARD: &str = "at::AutoNonVariableTypeMode non_var_type_mode(true);";

const UNBOXING_WRAPPERS: CodeTemplate = CodeTemplate::new(
    UNBOXING_WRAPPERS_FILE,
    r#"// @generated by generate-code from the operator declarations

#include "torch/csrc/jit/runtime/operator.h"
#include "torch/csrc/jit/runtime/register_ops_utils.h"

namespace torch { namespace jit {

using at::Scalar;
using at::Tensor;

namespace {

RegisterOperators reg({
    ${unboxed_ops}
});

${schema_registrations}

} // anon namespace

}} // namespace torch::jit
"#,
);

const UNBOXED_OP: CodeTemplate = CodeTemplate::new(
    "unboxed_op",
    r#"Operator(
    ${schema},
    [](Stack & stack) {
        ${autograd_guard}
        ${invoke}
        drop(stack, ${num_inputs});
        ${push_result}
    },
    aliasAnalysisFromSchema()
),"#,
);

const SCHEMA_ONLY_BLOCK: CodeTemplate = CodeTemplate::new(
    "schema_only",
    r#"TORCH_LIBRARY_FRAGMENT(aten, m) {
  ${schemas}
}"#,
);

/// What the wrapper file carries for one declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Full { exclude_autograd: bool },
    SchemaOnly,
    Omitted,
}

impl Registration {
    pub fn classify(
        record: &OperatorRecord,
        selector: &OperatorSelector,
        disable_autograd: bool,
        force_schema_registration: bool,
    ) -> Self {
        match selector.capabilities_for(record) {
            Some(caps) if caps.is_root_operator => Registration::Full {
                exclude_autograd: disable_autograd || !caps.is_used_for_training,
            },
            _ if force_schema_registration => Registration::SchemaOnly,
            _ => Registration::Omitted,
        }
    }
}

#[instrument(
    skip_all,
    fields(
        out = %out_dir.display(),
        disable_autograd = disable_autograd,
        force_schema_registration = force_schema_registration
    )
)]
pub fn gen_unboxing_wrappers(
    decls: &Declarations,
    out_dir: &Path,
    selector: &OperatorSelector,
    disable_autograd: bool,
    force_schema_registration: bool,
) -> Result<()> {
    let mut unboxed_ops = Vec::new();
    let mut schemas = Vec::new();
    for rec in decls {
        match Registration::classify(rec, selector, disable_autograd, force_schema_registration) {
            Registration::Full { exclude_autograd } => {
                unboxed_ops.push(emit_unboxed_op(rec, exclude_autograd)?);
            }
            Registration::SchemaOnly => {
                schemas.push(format!("m.def({});", serde_json::to_string(&rec.schema_string)?));
            }
            Registration::Omitted => {
                debug!(op = %rec.name_with_overload(), "not selected; omitted");
            }
        }
    }
    let (full, schema_only) = (unboxed_ops.len(), schemas.len());

    let schema_registrations = if schemas.is_empty() {
        String::new()
    } else {
        let mut env = Env::new();
        env.insert("schemas", schemas.into());
        SCHEMA_ONLY_BLOCK.substitute(&env)?
    };

    let mut env = Env::new();
    env.insert("unboxed_ops", unboxed_ops.into());
    env.insert("schema_registrations", schema_registrations.into());
    let text = UNBOXING_WRAPPERS.substitute(&env)?;
    FileManager::new(out_dir).write(UNBOXING_WRAPPERS_FILE, &text)?;

    info!(
        full,
        schema_only,
        omitted = decls.len() - full - schema_only,
        "generated unboxing wrappers"
    );
    Ok(())
}

fn emit_unboxed_op(rec: &OperatorRecord, exclude_autograd: bool) -> Result<String> {
    let n = rec.arguments.len();
    let args: Vec<String> = rec
        .arguments
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            format!(
                "(std::move(peek(stack, {}, {}))).{}",
                i,
                n,
                ivalue_accessor(&arg.dynamic_type)
            )
        })
        .collect();
    let call = format!("at::{}({})", rec.name, args.join(", "));

    let (invoke, push_result) = if rec.returns.is_empty() {
        (format!("{};", call), String::new())
    } else {
        (
            format!("auto result_ = {};", call),
            "pack(stack, std::move(result_));".to_string(),
        )
    };

    let mut env = Env::new();
    env.insert("schema", serde_json::to_string(&rec.schema_string)?.into());
    env.insert(
        "autograd_guard",
        if exclude_autograd { AUTOGRAD_GUARD } else { "" }.into(),
    );
    env.insert("invoke", invoke.into());
    env.insert("num_inputs", n.to_string().into());
    env.insert("push_result", push_result.into());
    UNBOXED_OP.substitute(&env)
}

/// IValue accessor for an argument type.
fn ivalue_accessor(dynamic_type: &str) -> String {
    match dynamic_type {
        "Tensor" => "toTensor()".to_string(),
        "Scalar" => "toScalar()".to_string(),
        "int64_t" | "int" => "toInt()".to_string(),
        "double" | "float" => "toDouble()".to_string(),
        "bool" => "toBool()".to_string(),
        "IntArrayRef" | "int[]" => "toIntVector()".to_string(),
        "TensorList" | "Tensor[]" => "toTensorVector()".to_string(),
        other => format!("to<{}>()", other),
    }
}
