// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator computations over an `IndicatorFrame`.
// Every function takes the frame by value and returns it with one or more
// aligned columns added; warm-up gaps are `None`, never zero. A function
// whose prerequisite column is missing returns its input unchanged.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod frame;
pub mod macd;
pub mod moving_average;
mod rolling;
pub mod rsi;
pub mod supertrend;
pub mod twap;
pub mod volatility;

pub use frame::IndicatorFrame;
