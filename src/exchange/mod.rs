// =============================================================================
// Exchange access — public market-data endpoints and symbol conventions
// =============================================================================

pub mod rate_limit;
pub mod rest;

pub use rest::MarketDataClient;

/// Quote assets recognized when splitting a combined symbol. Longest first so
/// FDUSD wins over USD-suffixed lookalikes.
const QUOTE_ASSETS: &[&str] = &["FDUSD", "USDT", "USDC", "TUSD", "BTC", "ETH", "BNB", "EUR"];

/// Convert a combined symbol to KuCoin's dashed form, e.g. BTCUSDT -> BTC-USDT.
///
/// A symbol whose quote asset is not recognized passes through unchanged;
/// KuCoin will reject it and the caller's error path reports the symbol.
pub fn to_kucoin_symbol(symbol: &str) -> String {
    if symbol.contains('-') {
        return symbol.to_string();
    }
    for quote in QUOTE_ASSETS {
        if let Some(base) = symbol.strip_suffix(quote) {
            if !base.is_empty() {
                return format!("{base}-{quote}");
            }
        }
    }
    symbol.to_string()
}

/// Convert a KuCoin dashed symbol back to the combined form,
/// e.g. BTC-USDT -> BTCUSDT.
pub fn from_kucoin_symbol(kucoin_symbol: &str) -> String {
    kucoin_symbol.replace('-', "")
}
