//! Legacy operator list file: a YAML sequence of operator names.
//!
//! - aten::add.Tensor
//! - aten::mul
//! - relu
//!
//! Entries are reduced to overload-stripped keys on load.

use crate::Result;
use crate::decl::OperatorKey;
use crate::diagnostics;

use anyhow::Context;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Read an op list file and strip namespaces and overloads.
pub fn load_op_list(path: &Path) -> Result<BTreeSet<OperatorKey>> {
    let text = fs::read_to_string(path).with_context(|| {
        diagnostics::error_message(format!("read selected op list {}", path.display()))
    })?;

    let names: Vec<String> = if text.trim().is_empty() {
        Vec::new()
    } else {
        serde_yaml::from_str(&text).with_context(|| {
            diagnostics::error_message(format!(
                "selected op list {} must be a YAML list of operator names",
                path.display()
            ))
        })?
    };

    Ok(strip_overloads(names.iter().map(String::as_str)))
}

/// Reduce operator names to their keys, dropping blanks.
pub fn strip_overloads<'a, I>(names: I) -> BTreeSet<OperatorKey>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .filter(|n| !n.trim().is_empty())
        .map(OperatorKey::from_operator_name)
        .collect()
}
