//! Shared wording for errors and warnings.
//!
//! Fatal errors travel up as `anyhow` chains; these helpers keep the message
//! text uniform and mirror each one into the trace log.

/// Build an error message for `bail!` / `with_context`.
pub fn error_message(msg: impl Into<String>) -> String {
    let msg = msg.into();
    tracing::debug!(target: "op_codegen::diagnostics", "{}", msg);
    msg
}

/// Report a non-fatal condition.
pub fn warn(msg: impl Into<String>) {
    tracing::warn!("{}", msg.into());
}
