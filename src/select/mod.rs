//! Selection layer: the policy object plus the legacy adapters that build it.

pub mod op_list;
pub mod profile;
pub mod selector;

pub use profile::{BuildProfile, infer_capabilities, load_selector};
pub use selector::{CapabilityFlags, OperatorSelector, SelectionConfig};
