//! Validation errors raised while turning indexer records into blocks.

use thiserror::Error;

/// A block record broke one of the block invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    /// Not 64 hex characters, or not starting with "00".
    #[error("field `{field}` is not a valid block hash: {value:?}")]
    InvalidHash { field: &'static str, value: String },

    #[error("field `{field}` must not be negative (got {value})")]
    Negative { field: &'static str, value: i64 },

    #[error("field `{field}` does not fit its type (got {value})")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("block at height {height} has no previous block hash")]
    MissingPreviousHash { height: u64 },
}

impl ValidationError {
    /// Name of the offending record field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field }
            | Self::InvalidHash { field, .. }
            | Self::Negative { field, .. }
            | Self::OutOfRange { field, .. } => field,
            Self::MissingPreviousHash { .. } => "previousblockhash",
        }
    }
}
