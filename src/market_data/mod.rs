pub mod candle;
pub mod error;
pub mod heikin_ashi;
pub mod normalizer;
pub mod pipeline;
pub mod resampler;

// Re-export the core series types for convenient access
// (e.g. `use crate::market_data::Candle`).
pub use candle::{Candle, CandleSeries};
pub use error::MarketDataError;
pub use normalizer::{normalize, ExchangeFormat};
pub use pipeline::{pre_process, TimeframeSeries};
