//! Declaration source: the operator registry as parsed from disk.
//!
//! Records are validated once at load time and are read-only afterwards;
//! every generation pass borrows the same `Declarations`.

pub mod load;
pub mod record;

pub use load::{Declarations, load_declarations};
pub use record::{Argument, OperatorKey, OperatorRecord, Return};
