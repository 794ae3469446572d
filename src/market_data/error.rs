// =============================================================================
// Errors produced by the market-data normalization path
// =============================================================================
//
// Malformed batches fail loudly and synchronously; the caller decides what to
// do with the rejected batch. None of these variants carry partial output.

use thiserror::Error;

use crate::types::ExchangeId;

/// All errors generated while turning a raw batch into a canonical series.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketDataError {
    /// Row width does not match any known layout for the exchange.
    #[error("column mismatch: {exchange} row has {width} columns, no known variant matches")]
    Format { exchange: ExchangeId, width: usize },

    /// Numeric coercion invalidated every row of the batch.
    #[error("series is empty after numeric coercion")]
    EmptySeries,

    /// A required column is entirely unusable across the batch.
    #[error("missing required column: {0}")]
    MissingColumns(&'static str),

    /// A transform needs at least one valid row and has none.
    #[error("insufficient data: {0}")]
    InsufficientData(&'static str),
}
