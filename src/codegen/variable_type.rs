//! Autograd kernel registrations, emitted only for operators that keep
//! training support.

use crate::Result;
use crate::codegen::file_manager::FileManager;
use crate::codegen::template::{CodeTemplate, Env};
use crate::decl::Declarations;
use crate::select::OperatorSelector;

use std::path::Path;
use tracing::{info, instrument};

pub const VARIABLE_TYPE_FILE: &str = "VariableType.cpp";

const VARIABLE_TYPE: CodeTemplate = CodeTemplate::new(
    VARIABLE_TYPE_FILE,
    r#"// @generated by generate-code from the operator declarations

#include "torch/csrc/autograd/VariableTypeUtils.h"

namespace torch { namespace autograd { namespace VariableType {

TORCH_LIBRARY_IMPL(aten, Autograd, m) {
  ${registrations}
}

}}} // namespace torch::autograd::VariableType
"#,
);

#[instrument(skip_all, fields(out = %out_dir.display()))]
pub fn gen_variable_type(
    decls: &Declarations,
    out_dir: &Path,
    selector: &OperatorSelector,
) -> Result<()> {
    let registrations: Vec<String> = decls
        .iter()
        .filter(|rec| selector.is_selected_for_training(rec))
        .map(|rec| {
            format!(
                "m.impl(\"{}\", TORCH_FN(VariableType::{}));",
                rec.name_with_overload(),
                rec.ident()
            )
        })
        .collect();
    let count = registrations.len();

    let mut env = Env::new();
    env.insert("registrations", registrations.into());
    let text = VARIABLE_TYPE.substitute(&env)?;
    FileManager::new(out_dir).write(VARIABLE_TYPE_FILE, &text)?;

    info!(kernels = count, total = decls.len(), "generated autograd kernels");
    Ok(())
}
