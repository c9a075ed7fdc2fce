//! Storage-layer error types.

/// Errors raised while building or querying a [`UnitTable`](crate::UnitTable).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    /// A unit with the same id has already been registered.
    #[error("unit already registered: {0}")]
    DuplicateUnit(String),

    /// No unit with the given id exists in the table.
    #[error("unknown unit: {0}")]
    NotFound(String),

    /// A conversion ratio had a zero numerator or denominator.
    #[error("invalid ratio {numer}/{denom}")]
    InvalidRatio {
        /// The offending numerator.
        numer: u32,
        /// The offending denominator.
        denom: u32,
    },

    /// The unit chosen as canonical does not have a ratio of exactly one.
    #[error("canonical unit {0} must have a ratio of 1")]
    CanonicalRatio(String),
}

/// Errors surfaced by the synchronous resolver path.
///
/// An unsupported target is never an error; only caller mistakes end up here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The requested or native unit is not registered.
    #[error(transparent)]
    Unit(#[from] UnitError),

    /// A slot range whose start lies after its end.
    #[error("invalid slot range {from}..{to}")]
    InvalidRange {
        /// First slot (inclusive).
        from: i32,
        /// Last slot (exclusive).
        to: i32,
    },
}
