use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use signal_core::{
    ChainEntry, ChainSource, MarketSnapshot, QuoteSource, SessionClock, SignalError,
};

const NSE_INDEX_URL: &str =
    "https://www.nseindia.com/api/equity-stock-indices?index=NIFTY%2050";
const NSE_ALL_INDICES_URL: &str = "https://www.nseindia.com/api/allIndices";
const NSE_CHAIN_URL: &str =
    "https://www.nseindia.com/api/option-chain-indices?symbol=NIFTY";
const YAHOO_CHART_URL: &str =
    "https://query1.finance.yahoo.com/v8/finance/chart/%5ENSEI";

const INDEX_NAME: &str = "NIFTY 50";

/// Strikes further than this from the underlying are dropped from the chain.
const STRIKE_WINDOW: f64 = 500.0;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36";

/// Tiered NIFTY market-data client: the NSE index endpoint first, the NSE
/// all-indices endpoint second, Yahoo Finance last. Every request carries a
/// hard timeout; callers fall back to cached data when all tiers fail.
#[derive(Clone)]
pub struct MarketDataClient {
    http: Client,
    clock: SessionClock,
}

impl MarketDataClient {
    pub fn new(clock: SessionClock) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, clock }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, SignalError> {
        let response = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| SignalError::fetch(format!("{url}: {e}")))?;
        if !response.status().is_success() {
            return Err(SignalError::fetch(format!(
                "{url}: HTTP {}",
                response.status()
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| SignalError::fetch(format!("{url}: {e}")))
    }

    async fn nse_index_quote(&self) -> Result<MarketSnapshot, SignalError> {
        let body: NseIndexResponse = self.get_json(NSE_INDEX_URL).await?;
        snapshot_from_index_rows(&body.data, self.clock.state())
            .ok_or_else(|| SignalError::fetch("NSE index feed returned no NIFTY row"))
    }

    async fn nse_all_indices_quote(&self) -> Result<MarketSnapshot, SignalError> {
        let body: AllIndicesResponse = self.get_json(NSE_ALL_INDICES_URL).await?;
        snapshot_from_all_indices(&body.data, self.clock.state())
            .ok_or_else(|| SignalError::fetch("NSE allIndices feed returned no NIFTY row"))
    }

    async fn yahoo_quote(&self) -> Result<MarketSnapshot, SignalError> {
        let body: YahooChartResponse = self.get_json(YAHOO_CHART_URL).await?;
        snapshot_from_chart(&body, self.clock.state())
            .ok_or_else(|| SignalError::fetch("Yahoo chart response carried no quote"))
    }
}

#[async_trait]
impl QuoteSource for MarketDataClient {
    async fn fetch(&self) -> Result<MarketSnapshot, SignalError> {
        match self.nse_index_quote().await {
            Ok(snapshot) => return Ok(snapshot),
            Err(err) => warn!(%err, "NSE index quote failed, trying allIndices"),
        }
        match self.nse_all_indices_quote().await {
            Ok(snapshot) => return Ok(snapshot),
            Err(err) => warn!(%err, "NSE allIndices quote failed, trying Yahoo"),
        }
        self.yahoo_quote().await
    }
}

#[async_trait]
impl ChainSource for MarketDataClient {
    async fn fetch(&self) -> Result<Vec<ChainEntry>, SignalError> {
        let body: OptionChainResponse = self.get_json(NSE_CHAIN_URL).await?;
        let entries = entries_from_chain(&body.records);
        if entries.is_empty() {
            return Err(SignalError::fetch("option chain carried no usable strikes"));
        }
        Ok(entries)
    }
}

// --- NSE wire formats -----------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct NseIndexResponse {
    #[serde(default)]
    pub(crate) data: Vec<NseIndexRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NseIndexRow {
    #[serde(default)]
    index: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
    last_price: Option<f64>,
    change: Option<f64>,
    p_change: Option<f64>,
    #[serde(default)]
    total_traded_volume: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AllIndicesResponse {
    #[serde(default)]
    pub(crate) data: Vec<AllIndicesRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AllIndicesRow {
    index: String,
    last: Option<f64>,
    variation: Option<f64>,
    percent_change: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OptionChainResponse {
    pub(crate) records: ChainRecords,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChainRecords {
    #[serde(default)]
    expiry_dates: Vec<String>,
    #[serde(default)]
    data: Vec<ChainRow>,
    underlying_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChainRow {
    strike_price: f64,
    expiry_date: String,
    #[serde(rename = "CE")]
    call: Option<ChainSide>,
    #[serde(rename = "PE")]
    put: Option<ChainSide>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChainSide {
    last_price: Option<f64>,
    total_traded_volume: Option<i64>,
}

// --- Yahoo wire format ----------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    #[serde(default)]
    result: Vec<YahooChartResult>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    meta: YahooMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooMeta {
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    regular_market_volume: Option<i64>,
}

// --- conversions (pure, unit tested) --------------------------------------

pub(crate) fn snapshot_from_index_rows(
    rows: &[NseIndexRow],
    session: signal_core::SessionState,
) -> Option<MarketSnapshot> {
    let row = rows.iter().find(|r| {
        r.index.as_deref() == Some(INDEX_NAME) || r.symbol.as_deref() == Some(INDEX_NAME)
    })?;
    let price = row.last_price?;
    Some(MarketSnapshot {
        price,
        change: row.change.unwrap_or(0.0),
        change_percent: row.p_change.unwrap_or(0.0),
        volume: row.total_traded_volume.unwrap_or(0),
        session,
    })
}

pub(crate) fn snapshot_from_all_indices(
    rows: &[AllIndicesRow],
    session: signal_core::SessionState,
) -> Option<MarketSnapshot> {
    let row = rows.iter().find(|r| r.index == INDEX_NAME)?;
    let price = row.last?;
    Some(MarketSnapshot {
        price,
        change: row.variation.unwrap_or(0.0),
        change_percent: row.percent_change.unwrap_or(0.0),
        // The summary feed carries no volume; the indicator layer treats
        // zero volume as the neutral ratio.
        volume: 0,
        session,
    })
}

pub(crate) fn snapshot_from_chart(
    body: &YahooChartResponse,
    session: signal_core::SessionState,
) -> Option<MarketSnapshot> {
    let meta = &body.chart.result.first()?.meta;
    let price = meta.regular_market_price?;
    let previous = meta.chart_previous_close.unwrap_or(price);
    let change = price - previous;
    let change_percent = if previous > 0.0 {
        change / previous * 100.0
    } else {
        0.0
    };
    Some(MarketSnapshot {
        price,
        change,
        change_percent,
        volume: meta.regular_market_volume.unwrap_or(0),
        session,
    })
}

/// Nearest-expiry strikes within the trading window around the underlying.
pub(crate) fn entries_from_chain(records: &ChainRecords) -> Vec<ChainEntry> {
    let Some(expiry) = records.expiry_dates.first() else {
        return Vec::new();
    };
    let underlying = records.underlying_value.unwrap_or(0.0);

    records
        .data
        .iter()
        .filter(|row| row.expiry_date == *expiry)
        .filter(|row| {
            underlying <= 0.0 || (row.strike_price - underlying).abs() <= STRIKE_WINDOW
        })
        .map(|row| ChainEntry {
            strike_price: row.strike_price,
            call_price: row.call.as_ref().and_then(|s| s.last_price).unwrap_or(0.0),
            call_volume: row
                .call
                .as_ref()
                .and_then(|s| s.total_traded_volume)
                .unwrap_or(0),
            put_price: row.put.as_ref().and_then(|s| s.last_price).unwrap_or(0.0),
            put_volume: row
                .put
                .as_ref()
                .and_then(|s| s.total_traded_volume)
                .unwrap_or(0),
            expiry_date: row.expiry_date.clone(),
        })
        .collect()
}
