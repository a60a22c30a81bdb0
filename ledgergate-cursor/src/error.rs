//! Error vocabulary crossing the engine boundary.

use ledgergate_core::KeyParseError;
use ledgergate_store::StoreError;
use thiserror::Error;

/// The three error kinds a cursor operation can surface.
///
/// `InvalidFormat` maps to HTTP 409, `NotFound` to 404, and `Store`
/// to 500 at the route adaptor.
#[derive(Debug, Error)]
pub enum CursorError {
    /// A supplied key or enum value failed its parser.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// A natural-key anchor lookup yielded no document, or a
    /// chain-dependent request targeted a height above the tip.
    #[error("no resource exists with the supplied identifier")]
    NotFound,

    /// An underlying store fault, surfaced unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<KeyParseError> for CursorError {
    fn from(err: KeyParseError) -> Self {
        CursorError::InvalidFormat(err.to_string())
    }
}
