//! Sticky terminal state shared by the writer and reader adapters

use streamflate_types::{Error, Result};

/// Lifecycle state of a stream adapter
///
/// `Closed` and `Errored` are terminal: once entered, the engine has been
/// torn down and no operation may touch it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StreamState {
    /// Accepting operations
    Open,
    /// Finished normally
    Closed,
    /// Permanently broken by the stored error
    Errored(Error),
}

impl StreamState {
    /// Error to re-return for an operation attempted in this state
    pub(crate) fn check_open(&self) -> Result<()> {
        match self {
            Self::Open => Ok(()),
            Self::Closed => Err(Error::Closed),
            Self::Errored(e) => Err(e.clone()),
        }
    }
}
