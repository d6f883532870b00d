use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use signal_core::{
    rule_based_sentiment, ChainEntry, MarketSentiment, MarketSnapshot, Sentiment,
    SentimentSource, SignalError, TradeRecommendation,
};

/// Remote sentiment classifier. Posts the snapshot and a chain sample to a
/// configurable endpoint; the engine falls back to the local rules when this
/// errors, so failures here are cheap.
pub struct RemoteSentiment {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl RemoteSentiment {
    pub fn new(endpoint: String, api_key: Option<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            endpoint,
            api_key,
        }
    }
}

#[derive(Serialize)]
struct SentimentRequest<'a> {
    price: f64,
    change: f64,
    change_percent: f64,
    volume: i64,
    chain: &'a [ChainEntry],
}

#[derive(Deserialize)]
struct SentimentResponse {
    sentiment: String,
    recommendation: String,
    #[serde(default)]
    reasoning: String,
}

#[async_trait]
impl SentimentSource for RemoteSentiment {
    async fn classify(
        &self,
        snapshot: &MarketSnapshot,
        chain: &[ChainEntry],
    ) -> Result<MarketSentiment, SignalError> {
        let mut request = self.http.post(&self.endpoint).json(&SentimentRequest {
            price: snapshot.price,
            change: snapshot.change,
            change_percent: snapshot.change_percent,
            volume: snapshot.volume,
            // Keep the payload small; the classifier only needs the shape
            // of activity around the money.
            chain: &chain[..chain.len().min(10)],
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SignalError::fetch(format!("sentiment endpoint: {e}")))?;
        if !response.status().is_success() {
            return Err(SignalError::fetch(format!(
                "sentiment endpoint: HTTP {}",
                response.status()
            )));
        }
        let body: SentimentResponse = response
            .json()
            .await
            .map_err(|e| SignalError::fetch(format!("sentiment endpoint: {e}")))?;

        Ok(MarketSentiment {
            sentiment: parse_sentiment(&body.sentiment)?,
            recommendation: parse_recommendation(&body.recommendation)?,
            reasoning: body.reasoning,
        })
    }
}

/// Local rule-based classifier behind the same trait, for wiring the engine
/// without any remote dependency.
pub struct RuleBasedSentiment;

#[async_trait]
impl SentimentSource for RuleBasedSentiment {
    async fn classify(
        &self,
        snapshot: &MarketSnapshot,
        _chain: &[ChainEntry],
    ) -> Result<MarketSentiment, SignalError> {
        Ok(rule_based_sentiment(snapshot))
    }
}

fn parse_sentiment(raw: &str) -> Result<Sentiment, SignalError> {
    match raw.to_ascii_uppercase().as_str() {
        "BULLISH" => Ok(Sentiment::Bullish),
        "BEARISH" => Ok(Sentiment::Bearish),
        "NEUTRAL" => Ok(Sentiment::Neutral),
        other => Err(SignalError::fetch(format!("unknown sentiment '{other}'"))),
    }
}

fn parse_recommendation(raw: &str) -> Result<TradeRecommendation, SignalError> {
    match raw.to_ascii_uppercase().as_str() {
        "BUY_CALL" => Ok(TradeRecommendation::BuyCall),
        "BUY_PUT" => Ok(TradeRecommendation::BuyPut),
        "DONT_TRADE" => Ok(TradeRecommendation::DontTrade),
        "MONITOR" => Ok(TradeRecommendation::Monitor),
        other => Err(SignalError::fetch(format!(
            "unknown recommendation '{other}'"
        ))),
    }
}
