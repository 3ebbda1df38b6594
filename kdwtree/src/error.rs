//! Error type returned by the fallible entry points of this crate.

use std::fmt;

/// Error returned when the caller-supplied input cannot be used to build or
/// query a [`crate::KdwTree`].
///
/// Violations of a method's own contract (e.g. `min`/`max` of mismatched
/// dimensionality passed to an already-built tree) are bugs in the caller
/// and panic instead of returning this type, in line with the rest of this
/// workspace (see `bitm::Select::select`, which panics rather than returning
/// a recoverable error on out-of-range ranks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdwError {
    /// The input passed to a constructor or query is structurally invalid:
    /// empty point set, ragged dimensionality, a non-finite coordinate, or a
    /// query rectangle with `min > max` on some axis.
    InvalidInput(&'static str),
}

impl fmt::Display for KdwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KdwError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for KdwError {}

/// Convenience alias for this crate's fallible results.
pub type Result<T> = std::result::Result<T, KdwError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message() {
        let e = KdwError::InvalidInput("empty point set");
        assert_eq!(e.to_string(), "invalid input: empty point set");
    }
}
