pub mod ingestor;
pub mod kucoin_ws;
pub mod publisher;

pub use ingestor::{run_forwarder, StreamIngestor};
pub use publisher::{KlineMessage, KlinePayload, LogPublisher, Publisher, KLINES_STORE_TOPIC};
