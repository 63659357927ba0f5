//! Unified error type.

use std::fmt;

/// The error type returned by strand's fallible operations.
///
/// Failures raised by middleware or handlers are not represented here: a
/// panicking constructor or handler unwinds straight through the chain, exactly
/// as it would if it had been called directly.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A chain was materialized without a terminal handler.
    ///
    /// There is no default destination to fall back on, so the caller decides
    /// whether this aborts startup or is reported some other way.
    MissingTerminal,
    /// The incoming request body could not be read.
    Body(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTerminal => f.write_str("chain has no terminal handler"),
            Self::Body(e) => write!(f, "body: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MissingTerminal => None,
            Self::Body(e) => Some(e.as_ref()),
        }
    }
}
