//! Error types for the abbreviation pipeline.

use std::fmt;
use std::io;

/// Errors raised while processing one diagram's pipeline run.
///
/// Configuration errors are rejected before extraction begins; the others
/// abort the affected diagram's run and propagate to the driver. Nothing is
/// silently swallowed.
#[derive(Debug)]
pub enum AbbrevError {
    /// The bracket/anti-bracket symbol set is empty.
    EmptySymbolSet,

    /// Two runs that must remain independent claimed the same prefix.
    PrefixCollision {
        /// The contested prefix.
        prefix: String,
        /// Owner that holds the claim.
        owner: String,
        /// Owner that attempted the second claim.
        claimant: String,
    },

    /// The extraction loop failed to reach a fixed point within its
    /// defensive iteration bound. Indicates malformed input (a caller-side
    /// contract violation), not a recoverable condition.
    FixedPointOverrun {
        /// Number of iterations performed before giving up.
        iterations: usize,
    },

    /// An artifact sink failed.
    Io(io::Error),
}

impl fmt::Display for AbbrevError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySymbolSet => {
                write!(f, "bracket symbol set is empty; nothing can be made external")
            }
            Self::PrefixCollision {
                prefix,
                owner,
                claimant,
            } => write!(
                f,
                "prefix '{prefix}' already claimed by '{owner}' (claimed again by '{claimant}')"
            ),
            Self::FixedPointOverrun { iterations } => write!(
                f,
                "extraction did not reach a fixed point within {iterations} iterations"
            ),
            Self::Io(err) => write!(f, "artifact sink failure: {err}"),
        }
    }
}

impl std::error::Error for AbbrevError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for AbbrevError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
