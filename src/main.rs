// =============================================================================
// Borealis Feed — Main Entry Point
// =============================================================================
//
// Two independent halves run side by side: per-symbol live kline feeds that
// throttle and republish candle events through the bounded queue, and a
// periodic batch analysis loop that fetches klines, normalizes them, and
// logs an indicator snapshot per symbol.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod exchange;
mod indicators;
mod market_data;
mod runtime_config;
mod stream;
mod types;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::exchange::MarketDataClient;
use crate::indicators::{
    atr::{self, atr},
    bollinger::{self, bollinger},
    macd::macd,
    moving_average::{ma_spreads, moving_average},
    rsi::rsi,
    supertrend::{self, supertrend},
    twap::{self, twap},
    volatility::{self, log_volatility},
    IndicatorFrame,
};
use crate::market_data::pre_process;
use crate::runtime_config::RuntimeConfig;
use crate::stream::{kucoin_ws, run_forwarder, LogPublisher, StreamIngestor};
use crate::types::{ExchangeId, KlineInterval};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Borealis Feed starting up");

    let mut config = RuntimeConfig::load("runtime_config.json").unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Override symbols from env if available.
    if let Ok(syms) = std::env::var("BOREALIS_SYMBOLS") {
        config.symbols = syms
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if config.symbols.is_empty() {
        config.symbols = RuntimeConfig::default().symbols;
    }

    info!(
        exchange = %config.exchange,
        symbols = ?config.symbols,
        interval = %config.stream_interval,
        queue_capacity = config.queue_capacity,
        "Configured feed"
    );

    // ── 2. Ingestor queue + publisher task ───────────────────────────────
    let (ingestor, queue_rx) = StreamIngestor::new(config.stream_interval, config.queue_capacity);

    tokio::spawn(async move {
        if let Err(e) = run_forwarder(queue_rx, LogPublisher).await {
            error!(error = %e, "kline forwarder stopped on publish failure");
        }
    });

    // ── 3. Live kline feeds, one per symbol ──────────────────────────────
    for symbol in &config.symbols {
        let ing = ingestor.clone();
        let sym = symbol.clone();
        let interval = config.stream_interval;
        tokio::spawn(async move {
            loop {
                if let Err(e) = kucoin_ws::run_kline_feed(&sym, interval, &ing).await {
                    error!(symbol = %sym, error = %e, "Kline feed error — reconnecting in 5s");
                }
                tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
            }
        });
    }
    info!(count = config.symbols.len(), "Live kline feeds launched");

    // ── 4. Batch analysis loop ───────────────────────────────────────────
    let analysis_config = config.clone();
    tokio::spawn(async move {
        let client = MarketDataClient::new();
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(
            analysis_config.analysis_interval_secs,
        ));
        loop {
            interval.tick().await;
            for symbol in &analysis_config.symbols {
                if let Err(e) = analyze_symbol(
                    &client,
                    analysis_config.exchange,
                    symbol,
                    analysis_config.stream_interval,
                    analysis_config.kline_fetch_limit,
                )
                .await
                {
                    warn!(symbol = %symbol, error = %e, "batch analysis failed");
                }
            }
            tracing::debug!(
                used_weight = client.rate_limits().used_weight(),
                "analysis round complete"
            );
        }
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 5. Shutdown ──────────────────────────────────────────────────────
    // No queue flush on shutdown: in-flight messages may be lost, which is
    // acceptable for a live telemetry feed.
    tokio::signal::ctrl_c().await?;
    warn!(
        dropped_events = ingestor.dropped_count(),
        "Shutdown signal received — stopping"
    );

    if let Err(e) = config.save("runtime_config.json") {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("Borealis Feed shut down complete.");
    Ok(())
}

/// Fetch a kline batch for `symbol`, run the batch pipeline, apply the
/// indicator suite per timeframe, and log a compact snapshot.
async fn analyze_symbol(
    client: &MarketDataClient,
    exchange: ExchangeId,
    symbol: &str,
    interval: KlineInterval,
    limit: u32,
) -> anyhow::Result<()> {
    let rows = client.fetch_klines(exchange, symbol, interval, limit).await?;
    let timeframes = pre_process(exchange, &rows)?;

    // Base interval: trend and oscillator columns.
    let mut base = IndicatorFrame::new(timeframes.base);
    for period in [7, 25, 100] {
        base = moving_average(base, period);
    }
    base = ma_spreads(base);
    base = macd(base);
    base = rsi(base, 14);
    base = bollinger(base, bollinger::DEFAULT_WINDOW, bollinger::DEFAULT_NUM_STD);
    base = log_volatility(base, volatility::DEFAULT_WINDOW);

    // Hourly: Supertrend on top of ATR.
    let mut hourly = IndicatorFrame::new(timeframes.hourly);
    hourly = atr(hourly, atr::DEFAULT_WINDOW);
    hourly = supertrend(hourly, supertrend::DEFAULT_MULTIPLIER);

    // Four-hourly: TWAP.
    let four_hourly = twap(
        IndicatorFrame::new(timeframes.four_hourly),
        twap::DEFAULT_PERIODS,
    );

    let last_close = base.series().last().map(|c| c.close);
    info!(
        symbol = %symbol,
        close = ?last_close,
        rsi = ?base.last_value("rsi"),
        macd = ?base.last_value("macd"),
        bb_mid = ?base.last_value("bb_mid"),
        volatility = ?base.last_value("perc_volatility"),
        supertrend_1h = ?hourly.last_value("supertrend"),
        supertrend_dir_1h = ?hourly.last_value("supertrend_dir"),
        twap_4h = ?four_hourly.last_value("twap"),
        "analysis snapshot"
    );
    Ok(())
}
