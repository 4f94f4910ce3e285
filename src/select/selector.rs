//! Operator selection policy.
//!
//! A selector answers two questions for every record: is it built, and with
//! which capabilities. It is built once per invocation and only ever read.

use crate::decl::{OperatorKey, OperatorRecord};
use crate::diagnostics;

use std::collections::{BTreeMap, BTreeSet};

/// Capabilities granted to a selected operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityFlags {
    /// Callable directly, not only from inside another operator.
    pub is_root_operator: bool,
    /// Keeps its autograd kernels.
    pub is_used_for_training: bool,
}

impl CapabilityFlags {
    pub const ALL: Self = Self {
        is_root_operator: true,
        is_used_for_training: true,
    };

    pub fn new(is_root_operator: bool, is_used_for_training: bool) -> Self {
        Self {
            is_root_operator,
            is_used_for_training,
        }
    }
}

/// Explicit selection input: which operators, under which flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionConfig {
    pub include_list: BTreeSet<OperatorKey>,
    pub is_root_operator: bool,
    pub is_used_for_training: bool,
}

impl SelectionConfig {
    pub fn into_selector(self) -> OperatorSelector {
        if self.include_list.is_empty() {
            diagnostics::warn("operator inclusion list is empty; no operator will be selected");
        }
        OperatorSelector::Restricted(Restriction {
            included: self.include_list,
            capabilities: CapabilityFlags::new(self.is_root_operator, self.is_used_for_training),
            overrides: BTreeMap::new(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Restriction {
    included: BTreeSet<OperatorKey>,
    capabilities: CapabilityFlags,
    overrides: BTreeMap<OperatorKey, CapabilityFlags>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OperatorSelector {
    /// Every operator, every capability.
    #[default]
    Unrestricted,
    /// Only listed operators, with uniform flags unless overridden.
    Restricted(Restriction),
}

impl OperatorSelector {
    pub fn unrestricted() -> Self {
        Self::Unrestricted
    }

    /// Build from a legacy allow list. Names are taken verbatim as
    /// overload-stripped keys; duplicates collapse.
    pub fn from_legacy_allow_list<I, S>(
        names: I,
        is_root_operator: bool,
        is_used_for_training: bool,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SelectionConfig {
            include_list: names.into_iter().map(OperatorKey::new).collect(),
            is_root_operator,
            is_used_for_training,
        }
        .into_selector()
    }

    /// Give one operator its own flags. Only meaningful for a restricted
    /// selector that includes `key`; ignored otherwise.
    pub fn with_capability_override(mut self, key: OperatorKey, flags: CapabilityFlags) -> Self {
        if let Self::Restricted(r) = &mut self {
            r.overrides.insert(key, flags);
        }
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::Unrestricted)
    }

    pub fn is_key_selected(&self, key: &OperatorKey) -> bool {
        match self {
            Self::Unrestricted => true,
            Self::Restricted(r) => r.included.contains(key),
        }
    }

    pub fn is_selected(&self, record: &OperatorRecord) -> bool {
        self.is_key_selected(&record.key())
    }

    /// Uniform flags in effect. An unrestricted selector grants everything.
    pub fn capabilities(&self) -> CapabilityFlags {
        match self {
            Self::Unrestricted => CapabilityFlags::ALL,
            Self::Restricted(r) => r.capabilities,
        }
    }

    /// Flags for one record, or `None` if it is not selected.
    pub fn capabilities_for(&self, record: &OperatorRecord) -> Option<CapabilityFlags> {
        let key = record.key();
        match self {
            Self::Unrestricted => Some(CapabilityFlags::ALL),
            Self::Restricted(r) if r.included.contains(&key) => {
                Some(r.overrides.get(&key).copied().unwrap_or(r.capabilities))
            }
            Self::Restricted(_) => None,
        }
    }

    pub fn is_root_operator(&self, record: &OperatorRecord) -> bool {
        self.capabilities_for(record)
            .is_some_and(|c| c.is_root_operator)
    }

    pub fn is_selected_for_training(&self, record: &OperatorRecord) -> bool {
        self.capabilities_for(record)
            .is_some_and(|c| c.is_used_for_training)
    }

    /// Number of listed keys; `None` when unrestricted.
    pub fn included_len(&self) -> Option<usize> {
        match self {
            Self::Unrestricted => None,
            Self::Restricted(r) => Some(r.included.len()),
        }
    }
}
