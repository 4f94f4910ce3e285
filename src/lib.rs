//! Selective operator code generation.
//!
//! Loads an operator declaration registry, decides which operators a build
//! materializes, and dispatches the generation passes that write bindings,
//! dispatch wrappers and annotation metadata.

pub mod codegen;
pub mod decl;
pub mod diagnostics;
pub mod select;

pub type Result<T> = anyhow::Result<T>;

pub use codegen::{GenerateOptions, OutputDirs, Subset, generate_code};
pub use decl::{Declarations, OperatorKey, OperatorRecord, load_declarations};
pub use select::{CapabilityFlags, OperatorSelector, SelectionConfig};
