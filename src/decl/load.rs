//! Declarations file (YAML or JSON).
//!
//! Shape:
//! - name: add
//!   overload_name: Tensor          # optional, "" means none
//!   schema_string: "aten::add.Tensor(Tensor self, Tensor other, *, Scalar alpha=1) -> Tensor"
//!   method_of: [Tensor, namespace] # optional, defaults to [namespace]
//!   arguments:
//!     - { name: self, dynamic_type: Tensor }
//!     - { name: alpha, dynamic_type: Scalar, default: 1, kwarg_only: true }
//!   returns:
//!     - { dynamic_type: Tensor }
//!
//! Raw rows are validated into `Declarations`; order is preserved.

use crate::Result;
use crate::decl::record::{Argument, OperatorRecord, Return};
use crate::diagnostics;

use anyhow::{Context, bail};
use regex::Regex;
use serde::Deserialize;
use serde::de::Deserializer;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Raw record shape as it appears in the declarations file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDeclaration {
    pub name: String,

    #[serde(default)]
    pub overload_name: String,

    #[serde(default)]
    pub schema_string: String,

    #[serde(default = "default_method_of")]
    pub method_of: Vec<String>,

    #[serde(default)]
    pub arguments: Vec<RawArgument>,

    #[serde(default)]
    pub returns: Vec<RawReturn>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawArgument {
    pub name: String,

    /// `type` (the C++ spelling) is ignored; `dynamic_type` drives codegen.
    pub dynamic_type: String,

    #[serde(default, deserialize_with = "deserialize_default")]
    pub default: Option<String>,

    #[serde(default)]
    pub kwarg_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawReturn {
    pub dynamic_type: String,
}

fn default_method_of() -> Vec<String> {
    vec!["namespace".to_string()]
}

/// Defaults show up as strings, numbers or booleans depending on the author.
fn deserialize_default<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Literal {
        Str(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(Option::<Literal>::deserialize(deserializer)?.map(|lit| match lit {
        Literal::Str(s) => s,
        Literal::Int(i) => i.to_string(),
        Literal::Float(f) => f.to_string(),
        Literal::Bool(b) => (if b { "True" } else { "False" }).to_string(),
    }))
}

/// Validated, ordered operator registry.
#[derive(Debug, Clone, Default)]
pub struct Declarations {
    records: Vec<OperatorRecord>,
}

impl Declarations {
    /// Validate records:
    /// - non-empty base name without `.`
    /// - non-empty schema whose head matches name and overload
    /// - unique (name, overload) pairs
    pub fn new(records: Vec<OperatorRecord>) -> Result<Self> {
        const SCHEMA_HEAD_RE: &str = r"^\s*(?:\w+::)?(\w+)(?:\.(\w+))?\s*\(";
        let head = Regex::new(SCHEMA_HEAD_RE)?;

        let mut seen: BTreeSet<String> = BTreeSet::new();
        for (idx, rec) in records.iter().enumerate() {
            if rec.name.is_empty() {
                bail!(
                    "{}",
                    diagnostics::error_message(format!("declaration #{} has an empty name", idx))
                );
            }
            if rec.name.contains('.') {
                bail!(
                    "{}",
                    diagnostics::error_message(format!(
                        "declaration {:?} puts an overload in its name; use overload_name",
                        rec.name
                    ))
                );
            }
            if rec.schema_string.trim().is_empty() {
                bail!(
                    "{}",
                    diagnostics::error_message(format!(
                        "declaration {} has an empty schema_string",
                        rec.name_with_overload()
                    ))
                );
            }

            let caps = match head.captures(&rec.schema_string) {
                Some(c) => c,
                None => {
                    bail!(
                        "{}",
                        diagnostics::error_message(format!(
                            "declaration {}: cannot parse schema head: {:?}",
                            rec.name_with_overload(),
                            rec.schema_string
                        ))
                    );
                }
            };
            let schema_name = caps.get(1).map_or("", |m| m.as_str());
            let schema_overload = caps.get(2).map(|m| m.as_str());
            if schema_name != rec.name || schema_overload != rec.overload_name.as_deref() {
                bail!(
                    "{}",
                    diagnostics::error_message(format!(
                        "declaration {} disagrees with its schema {:?}",
                        rec.name_with_overload(),
                        rec.schema_string
                    ))
                );
            }

            if !seen.insert(rec.name_with_overload()) {
                bail!(
                    "{}",
                    diagnostics::error_message(format!(
                        "duplicate declaration: {}",
                        rec.name_with_overload()
                    ))
                );
            }
        }

        Ok(Self { records })
    }

    /// Convert raw rows and validate them.
    pub fn from_raw(raw: Vec<RawDeclaration>) -> Result<Self> {
        let records = raw
            .into_iter()
            .map(|r| OperatorRecord {
                name: r.name.trim().to_string(),
                overload_name: Some(r.overload_name.trim().to_string()).filter(|s| !s.is_empty()),
                schema_string: r.schema_string,
                method_of: r.method_of,
                arguments: r
                    .arguments
                    .into_iter()
                    .map(|a| Argument {
                        name: a.name,
                        dynamic_type: a.dynamic_type,
                        default: a.default,
                        kwarg_only: a.kwarg_only,
                    })
                    .collect(),
                returns: r
                    .returns
                    .into_iter()
                    .map(|r| Return {
                        dynamic_type: r.dynamic_type,
                    })
                    .collect(),
            })
            .collect();
        Self::new(records)
    }

    pub fn records(&self) -> &[OperatorRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OperatorRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Declarations {
    type Item = &'a OperatorRecord;
    type IntoIter = std::slice::Iter<'a, OperatorRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Read and validate a declarations file. `.json` is parsed as JSON,
/// anything else as YAML.
pub fn load_declarations(path: &Path) -> Result<Declarations> {
    let text = fs::read_to_string(path).with_context(|| {
        diagnostics::error_message(format!("read declarations file {}", path.display()))
    })?;

    let raw: Vec<RawDeclaration> = if text.trim().is_empty() {
        Vec::new()
    } else if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&text).with_context(|| {
            diagnostics::error_message(format!("parse declarations JSON {}", path.display()))
        })?
    } else {
        serde_yaml::from_str(&text).with_context(|| {
            diagnostics::error_message(format!("parse declarations YAML {}", path.display()))
        })?
    };

    Declarations::from_raw(raw).with_context(|| {
        diagnostics::error_message(format!("invalid declarations in {}", path.display()))
    })
}
