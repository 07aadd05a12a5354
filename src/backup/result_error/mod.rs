//! Crate error type plus the context combinators shared by `Error` and `Result`.
//!
//! Every error renders on a single line so it can be dropped straight into a
//! run log entry.

pub mod error;
pub mod result;

/// Prefixes an error with a human readable message.
pub trait WithMsg<S: Into<String>> {
    fn with_msg(self, msg: S) -> Self;
}
