//! `${name}` code templates.
//!
//! A placeholder that is alone on its line expands block-wise: every item of a
//! list value (and every line of a string value) gets the placeholder's
//! indentation, and an empty value drops the line. Anywhere else a list is
//! joined with ", ".
//!
//! Values are inserted verbatim and never rescanned, so generated text may
//! itself contain `${...}`.

use crate::Result;
use crate::diagnostics;

use anyhow::bail;
use regex::{Captures, Regex};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    List(Vec<String>),
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

pub type Env = BTreeMap<&'static str, Value>;

#[derive(Debug, Clone, Copy)]
pub struct CodeTemplate {
    name: &'static str,
    pattern: &'static str,
}

impl CodeTemplate {
    pub const fn new(name: &'static str, pattern: &'static str) -> Self {
        Self { name, pattern }
    }

    pub fn substitute(&self, env: &Env) -> Result<String> {
        const BLOCK_RE: &str = r"^([ \t]*)\$\{(\w+)\}[ \t]*$";
        const INLINE_RE: &str = r"\$\{(\w+)\}";
        let block = Regex::new(BLOCK_RE)?;
        let inline = Regex::new(INLINE_RE)?;

        let missing: Vec<&str> = inline
            .captures_iter(self.pattern)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .filter(|key| !env.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            bail!(
                "{}",
                diagnostics::error_message(format!(
                    "template {}: no value for {}",
                    self.name,
                    missing
                        .iter()
                        .map(|k| format!("${{{}}}", k))
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            );
        }

        let mut out: Vec<String> = Vec::new();
        for line in self.pattern.split('\n') {
            if let Some(caps) = block.captures(line) {
                let indent = caps.get(1).map_or("", |m| m.as_str());
                let items: Vec<&str> = match env.get(&caps[2]) {
                    Some(Value::Str(s)) if s.is_empty() => Vec::new(),
                    Some(Value::Str(s)) => vec![s.as_str()],
                    Some(Value::List(items)) => items.iter().map(String::as_str).collect(),
                    None => Vec::new(),
                };
                for item in items {
                    for l in item.split('\n') {
                        if l.is_empty() {
                            out.push(String::new());
                        } else {
                            out.push(format!("{}{}", indent, l));
                        }
                    }
                }
                continue;
            }

            let replaced = inline.replace_all(line, |caps: &Captures| match env.get(&caps[1]) {
                Some(Value::Str(s)) => s.clone(),
                Some(Value::List(items)) => items.join(", "),
                None => String::new(),
            });
            out.push(replaced.into_owned());
        }

        Ok(out.join("\n"))
    }
}
