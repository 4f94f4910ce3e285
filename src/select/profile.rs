//! Build-profile inference for legacy op list files.
//!
//! The legacy list format has no room for capability flags, so they are read
//! off the file name instead:
//! - `root_op_list.yaml`      => root operators only, no training
//! - `combined_op_list.yaml`  => root operators with training
//! - any other name           => assume every capability
//!
//! This never fails. It only produces a `SelectionConfig`; the selector
//! itself knows nothing about file names.

use crate::Result;
use crate::select::op_list::{load_op_list, strip_overloads};
use crate::select::selector::{CapabilityFlags, OperatorSelector, SelectionConfig};

use std::path::Path;
use tracing::{debug, info};

pub const ROOT_OP_LIST_MARKER: &str = "root_op_list.yaml";
pub const COMBINED_OP_LIST_MARKER: &str = "combined_op_list.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildProfile {
    RootOnly,
    Combined,
    /// Unrecognized file name, usually an externally authored list.
    External,
}

impl BuildProfile {
    pub fn from_path(path: &Path) -> Self {
        let path = path.to_string_lossy();
        if path.contains(COMBINED_OP_LIST_MARKER) {
            Self::Combined
        } else if path.contains(ROOT_OP_LIST_MARKER) {
            Self::RootOnly
        } else {
            Self::External
        }
    }

    pub fn capabilities(self) -> CapabilityFlags {
        match self {
            Self::RootOnly => CapabilityFlags::new(true, false),
            Self::Combined | Self::External => CapabilityFlags::ALL,
        }
    }
}

/// Flags implied by an op list path; `None` means no list, so no restriction.
pub fn infer_capabilities(op_list_path: Option<&Path>) -> Option<CapabilityFlags> {
    op_list_path.map(|p| BuildProfile::from_path(p).capabilities())
}

/// Build the selector for one invocation.
///
/// Names from the list file and `extra_ops` are unioned. With neither, the
/// selector is unrestricted.
pub fn load_selector(
    op_list_path: Option<&Path>,
    extra_ops: &[String],
) -> Result<OperatorSelector> {
    if op_list_path.is_none() && extra_ops.is_empty() {
        debug!("no operator list given; selecting every operator");
        return Ok(OperatorSelector::unrestricted());
    }

    let mut include_list = match op_list_path {
        Some(path) => load_op_list(path)?,
        None => Default::default(),
    };
    include_list.extend(strip_overloads(extra_ops.iter().map(String::as_str)));

    let profile = op_list_path.map_or(BuildProfile::External, BuildProfile::from_path);
    let flags = profile.capabilities();
    info!(
        operators = include_list.len(),
        ?profile,
        is_root_operator = flags.is_root_operator,
        is_used_for_training = flags.is_used_for_training,
        "restricting operator selection"
    );

    Ok(SelectionConfig {
        include_list,
        is_root_operator: flags.is_root_operator,
        is_used_for_training: flags.is_used_for_training,
    }
    .into_selector())
}
