//! Generation dispatch.
//!
//! One invocation resolves three output directories, creates them if needed,
//! and runs the requested passes in a fixed order:
//! bindings -> libtorch (autograd kernels, unboxing wrappers) -> python.
//! The first failing pass aborts the run; files already written stay.

pub mod annotated;
pub mod bindings;
pub mod file_manager;
pub mod template;
pub mod variable_type;
pub mod wrappers;

use crate::Result;
use crate::decl::Declarations;
use crate::diagnostics;
use crate::select::OperatorSelector;

use anyhow::{Context, bail};
use clap::ValueEnum;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

pub const DEFAULT_DECLARATIONS_PATH: &str = "torch/share/ATen/Declarations.yaml";
pub const DEFAULT_INSTALL_DIR: &str = "torch/csrc";
pub const DEFAULT_PYTHON_INSTALL_DIR: &str = "torch/testing/_internal/generated";

/// A named group of generation passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Subset {
    /// Python binding functions.
    #[value(alias = "pybindings")]
    Bindings,
    /// Autograd kernels and unboxing dispatch wrappers.
    Libtorch,
    /// Annotated argument metadata.
    Python,
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Subset::Bindings => "bindings",
            Subset::Libtorch => "libtorch",
            Subset::Python => "python",
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// `None` runs every pass.
    pub subset: Option<Subset>,
    pub install_dir: Option<PathBuf>,
    pub disable_autograd: bool,
    pub force_schema_registration: bool,
}

impl GenerateOptions {
    pub fn runs(&self, pass: Subset) -> bool {
        self.subset.is_none_or(|s| s == pass)
    }
}

/// Output directories of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirs {
    /// Python bindings and autograd kernels.
    pub autograd: PathBuf,
    /// Unboxing wrappers.
    pub jit: PathBuf,
    /// Annotation metadata.
    pub python: PathBuf,
}

impl OutputDirs {
    /// Without an install dir, python metadata goes to its own default
    /// location; with one, the install dir doubles as the metadata dir.
    pub fn resolve(install_dir: Option<&Path>) -> Self {
        let (install_dir, python) = match install_dir {
            Some(dir) => (dir.to_path_buf(), dir.to_path_buf()),
            None => (
                PathBuf::from(DEFAULT_INSTALL_DIR),
                PathBuf::from(DEFAULT_PYTHON_INSTALL_DIR),
            ),
        };
        Self {
            autograd: install_dir.join("autograd").join("generated"),
            jit: install_dir.join("jit").join("generated"),
            python,
        }
    }

    pub fn all(&self) -> [&Path; 3] {
        [&self.autograd, &self.jit, &self.python]
    }

    /// Check every directory first, then create the missing ones.
    pub fn ensure(&self) -> Result<()> {
        for dir in self.all() {
            if dir.exists() && !dir.is_dir() {
                bail!(
                    "{}",
                    diagnostics::error_message(format!(
                        "output path {} exists and is not a directory",
                        dir.display()
                    ))
                );
            }
        }
        for dir in self.all() {
            ensure_dir(dir)?;
        }
        Ok(())
    }
}

/// Create `dir` and its parents unless it already exists.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        debug!(dir = %dir.display(), "output directory exists");
        return Ok(());
    }
    std::fs::create_dir_all(dir).with_context(|| {
        diagnostics::error_message(format!("create output directory {}", dir.display()))
    })?;
    debug!(dir = %dir.display(), "created output directory");
    Ok(())
}

/// Run the requested passes against one registry and one selector.
#[instrument(skip_all, fields(subset = ?options.subset))]
pub fn generate_code(
    decls: &Declarations,
    selector: &OperatorSelector,
    options: &GenerateOptions,
) -> Result<OutputDirs> {
    let dirs = OutputDirs::resolve(options.install_dir.as_deref());
    dirs.ensure()?;

    info!(
        declarations = decls.len(),
        selected = decls.iter().filter(|r| selector.is_selected(r)).count(),
        unrestricted = selector.is_unrestricted(),
        "starting generation"
    );

    if options.runs(Subset::Bindings) {
        bindings::gen_python_bindings(decls, &dirs.autograd)
            .with_context(|| diagnostics::error_message("bindings generation failed"))?;
    }

    if options.runs(Subset::Libtorch) {
        if options.disable_autograd {
            debug!("autograd disabled; skipping autograd kernels");
        } else {
            variable_type::gen_variable_type(decls, &dirs.autograd, selector)
                .with_context(|| diagnostics::error_message("autograd kernel generation failed"))?;
        }
        wrappers::gen_unboxing_wrappers(
            decls,
            &dirs.jit,
            selector,
            options.disable_autograd,
            options.force_schema_registration,
        )
        .with_context(|| diagnostics::error_message("unboxing wrapper generation failed"))?;
    }

    if options.runs(Subset::Python) {
        annotated::gen_annotated(decls, &dirs.python)
            .with_context(|| diagnostics::error_message("annotation metadata generation failed"))?;
    }

    Ok(dirs)
}
