use async_trait::async_trait;

use crate::{ChainEntry, MarketSentiment, MarketSnapshot, SignalError};

/// Supplies the current index quote. Implementations must carry explicit
/// request timeouts; the caller degrades to a cached snapshot on failure.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn fetch(&self) -> Result<MarketSnapshot, SignalError>;
}

/// Supplies the strike-level options chain; may legitimately be empty when
/// the session is closed and no cache exists.
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<ChainEntry>, SignalError>;
}

/// Optional sentiment enrichment over the snapshot and a chain sample.
/// A local rule-based fallback is always used when this fails.
#[async_trait]
pub trait SentimentSource: Send + Sync {
    async fn classify(
        &self,
        snapshot: &MarketSnapshot,
        chain: &[ChainEntry],
    ) -> Result<MarketSentiment, SignalError>;
}

/// Outbound messaging channel. Best-effort: failures are logged by the
/// caller, never raised past the pipeline.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, message: &str) -> Result<(), SignalError>;

    /// Fan the message out to every subscribed recipient. Channels without
    /// a subscriber concept ignore this.
    async fn broadcast(&self, _message: &str) -> Result<(), SignalError> {
        Ok(())
    }
}

/// Fire-and-forget fan-out to dashboard subscribers. A slow or failed
/// subscriber must not stall the publishing tick.
pub trait Broadcaster: Send + Sync {
    fn publish(&self, event: &str, payload: serde_json::Value);
}
