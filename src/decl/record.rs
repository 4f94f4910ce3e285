use std::fmt;

/// Overload-stripped operator name used for selection lookups.
///
/// Inclusion lists are authored per base operator, so `add.Tensor` and
/// `add.Scalar` share the key `add`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperatorKey(String);

impl OperatorKey {
    /// Wrap a name that is already a base name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Parse a free-form operator name such as `aten::add.Tensor`.
    ///
    /// Drops every `ns::` qualifier and any `.overload` suffix.
    pub fn from_operator_name(name: &str) -> Self {
        let name = name.trim();
        let name = name.rsplit_once("::").map_or(name, |(_, rest)| rest);
        let base = name.split_once('.').map_or(name, |(base, _)| base);
        Self(base.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: String,
    pub dynamic_type: String,
    pub default: Option<String>,
    pub kwarg_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Return {
    pub dynamic_type: String,
}

/// One operator overload from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorRecord {
    pub name: String,
    pub overload_name: Option<String>,
    pub schema_string: String,
    pub method_of: Vec<String>,
    pub arguments: Vec<Argument>,
    pub returns: Vec<Return>,
}

impl OperatorRecord {
    /// A namespace function with no argument metadata.
    pub fn new(name: &str, overload_name: Option<&str>, schema_string: &str) -> Self {
        Self {
            name: name.to_string(),
            overload_name: overload_name.map(str::to_string),
            schema_string: schema_string.to_string(),
            method_of: vec!["namespace".to_string()],
            arguments: Vec::new(),
            returns: Vec::new(),
        }
    }

    pub fn key(&self) -> OperatorKey {
        OperatorKey::new(self.name.clone())
    }

    /// `add.Tensor`, or just `add` when there is no overload.
    pub fn name_with_overload(&self) -> String {
        match &self.overload_name {
            Some(overload) => format!("{}.{}", self.name, overload),
            None => self.name.clone(),
        }
    }

    /// C++-safe identifier: `add_Tensor`.
    pub fn ident(&self) -> String {
        match &self.overload_name {
            Some(overload) => format!("{}_{}", self.name, overload),
            None => self.name.clone(),
        }
    }

    pub fn is_namespace_function(&self) -> bool {
        self.method_of.iter().any(|m| m == "namespace")
    }

    /// Python-facing signature, e.g. `add(Tensor self, Tensor other, *, Scalar alpha=1)`.
    pub fn python_signature(&self) -> String {
        let mut parts = Vec::with_capacity(self.arguments.len() + 1);
        let mut seen_kwarg_only = false;
        for arg in &self.arguments {
            if arg.kwarg_only && !seen_kwarg_only {
                parts.push("*".to_string());
                seen_kwarg_only = true;
            }
            match &arg.default {
                Some(default) => {
                    parts.push(format!("{} {}={}", arg.dynamic_type, arg.name, default))
                }
                None => parts.push(format!("{} {}", arg.dynamic_type, arg.name)),
            }
        }
        format!("{}({})", self.name, parts.join(", "))
    }
}
