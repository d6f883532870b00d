use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Exchange session state per the NSE trading window (09:15-15:30 IST, Mon-Fri).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Open,
    PreMarket,
    Closed,
    Weekend,
}

impl SessionState {
    pub fn is_open(&self) -> bool {
        matches!(self, SessionState::Open)
    }
}

/// Point-in-time index quote. Superseded every tick; carries no identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: i64,
    pub session: SessionState,
}

impl MarketSnapshot {
    /// Hardcoded neutral quote used only when no real data was ever fetched.
    pub fn fallback(session: SessionState) -> Self {
        Self {
            price: 19845.30,
            change: 0.0,
            change_percent: 0.0,
            volume: 0,
            session,
        }
    }
}

/// One strike row of the options chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEntry {
    pub strike_price: f64,
    pub call_price: f64,
    pub call_volume: i64,
    pub put_price: f64,
    pub put_volume: i64,
    pub expiry_date: String,
}

/// Synthetic OHLC bar derived from the current quote.
///
/// Invariant: `low <= min(open, close)` and `high >= max(open, close)`,
/// enforced by clamping after the random range draws.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SyntheticOhlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub lower: f64,
    /// Position of the current price within the band, 0-100.
    pub position: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Macd {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SupportResistance {
    pub support_1: f64,
    pub support_2: f64,
    pub resistance_1: f64,
    pub resistance_2: f64,
}

/// Full indicator set computed each tick from a single snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorBundle {
    pub ohlc: SyntheticOhlc,
    /// Bounded [10, 90].
    pub rsi: f64,
    pub sma20: f64,
    pub sma50: f64,
    pub ema20: f64,
    pub bollinger: BollingerBands,
    pub macd: Macd,
    pub volume: i64,
    /// Current volume vs the fixed 1,200,000 baseline.
    pub volume_ratio: f64,
    /// Average true range as a percentage of price.
    pub atr: f64,
    /// Composite volatility score.
    pub volatility: f64,
    pub levels: SupportResistance,
}

/// Trend classification, strongest first-match wins (see ConditionAnalyzer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    StrongBullish,
    Bullish,
    Sideways,
    Bearish,
    StrongBearish,
}

impl Trend {
    pub fn is_bullish(&self) -> bool {
        matches!(self, Trend::Bullish | Trend::StrongBullish)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, Trend::Bearish | Trend::StrongBearish)
    }

    pub fn is_strong(&self) -> bool {
        matches!(self, Trend::StrongBullish | Trend::StrongBearish)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandleType {
    Bullish,
    Bearish,
    Doji,
}

/// Single-candle descriptor; sizes are percentages of the reference price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CandlePattern {
    #[serde(rename = "type")]
    pub kind: CandleType,
    pub body_size: f64,
    pub upper_wick: f64,
    pub lower_wick: f64,
}

/// Classified market state for the current tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConditions {
    pub trend: Trend,
    /// Bounded [30, 95].
    pub strength: f64,
    /// Bounded [20, 90].
    pub momentum: f64,
    pub candle_pattern: CandlePattern,
}

/// The four holding-horizon strategies scored every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyKind {
    Scalping,
    Intraday,
    Btst,
    Positional,
}

impl StrategyKind {
    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::Scalping => "Scalping",
            StrategyKind::Intraday => "Intraday",
            StrategyKind::Btst => "BTST",
            StrategyKind::Positional => "Positional",
        }
    }

    pub fn holding_period(&self) -> &'static str {
        match self {
            StrategyKind::Scalping => "5-30 minutes",
            StrategyKind::Intraday => "Same day (square off by 3:15 PM)",
            StrategyKind::Btst => "Buy today, sell tomorrow",
            StrategyKind::Positional => "3-10 trading days",
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        match self {
            StrategyKind::Scalping => RiskLevel::High,
            StrategyKind::Intraday => RiskLevel::Medium,
            StrategyKind::Btst => RiskLevel::Medium,
            StrategyKind::Positional => RiskLevel::Low,
        }
    }

    pub fn capital_allocation(&self) -> &'static str {
        match self {
            StrategyKind::Scalping => "5-10% of capital",
            StrategyKind::Intraday => "10-20% of capital",
            StrategyKind::Btst => "10-15% of capital",
            StrategyKind::Positional => "15-25% of capital",
        }
    }

    /// Option-target rescale applied after the base premium model.
    pub fn target_multiplier(&self) -> f64 {
        match self {
            StrategyKind::Scalping => 0.6,
            StrategyKind::Intraday => 1.0,
            StrategyKind::Btst => 1.5,
            StrategyKind::Positional => 2.0,
        }
    }

    pub fn stop_multiplier(&self) -> f64 {
        match self {
            StrategyKind::Scalping => 0.5,
            StrategyKind::Intraday => 1.0,
            StrategyKind::Btst => 1.0,
            StrategyKind::Positional => 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// A scored strategy recommendation. Recomputed every tick, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingStrategy {
    pub kind: StrategyKind,
    pub recommended: bool,
    /// Score capped per strategy, [0, 95].
    pub confidence: f64,
    pub reasoning: String,
    pub holding_period: String,
    pub risk_level: RiskLevel,
    pub capital_allocation: String,
    pub entry_conditions: Vec<String>,
    pub exit_conditions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Call,
    Put,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Call => "CALL",
            Direction::Put => "PUT",
        }
    }
}

/// Per-group rubric sub-scores, each expressed as a percentage of its cap.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub technical: f64,
    pub volume: f64,
    pub volatility: f64,
    pub market_conditions: f64,
}

/// A generated trade recommendation. Append-only; immutable after creation
/// except for the `notified` flag.
///
/// `confidence` is the rule-based signal strength [60, 95];
/// `win_probability` is the rubric score [10, 95]. They are independent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSignal {
    pub id: u64,
    pub direction: Direction,
    pub strike_price: f64,
    pub target_price: f64,
    pub stop_loss: f64,
    pub confidence: f64,
    pub reasoning: String,
    pub expiry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub notified: bool,
    pub strategy: StrategyKind,
    pub strategy_reasoning: String,
    pub holding_period: String,
    pub risk_level: RiskLevel,
    pub win_probability: f64,
    /// Top contributing factor descriptions, in rubric evaluation order.
    pub probability_factors: Vec<String>,
    pub risk_reward: f64,
    pub trade_score: f64,
    pub scores: ScoreBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    Active,
    Exited,
    Stopped,
}

impl TradeStatus {
    /// EXITED/STOPPED are terminal; ACTIVE -> terminal is one-way.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TradeStatus::Active)
    }
}

/// Alert kinds raised by the trade monitor, each at most once per trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    TargetHit,
    StopLossHit,
    Profit50,
    Profit25,
    Loss20,
    Loss10,
    TimeExit,
}

impl AlertKind {
    pub fn label(&self) -> &'static str {
        match self {
            AlertKind::TargetHit => "TARGET_HIT",
            AlertKind::StopLossHit => "STOP_LOSS_HIT",
            AlertKind::Profit50 => "PROFIT_50",
            AlertKind::Profit25 => "PROFIT_25",
            AlertKind::Loss20 => "LOSS_20",
            AlertKind::Loss10 => "LOSS_10",
            AlertKind::TimeExit => "TIME_EXIT",
        }
    }
}

/// A user position opened against a signal. Mutated only by the trade
/// monitor and by an explicit user exit; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveTrade {
    pub id: u64,
    /// Weak reference: lookup only, the signal may no longer qualify.
    pub signal_id: u64,
    pub user_id: String,
    pub entry_price: f64,
    pub current_price: f64,
    pub quantity: u32,
    pub entry_time: DateTime<Utc>,
    pub status: TradeStatus,
    pub pnl: f64,
    pub pnl_percent: f64,
    pub target_hit: bool,
    pub sl_hit: bool,
    pub alerts_sent: HashSet<AlertKind>,
    pub last_alert_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeRecommendation {
    BuyCall,
    BuyPut,
    DontTrade,
    Monitor,
}

/// Sentiment classification for the current snapshot, from the remote
/// classifier or the local rule-based fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSentiment {
    pub sentiment: Sentiment,
    pub recommendation: TradeRecommendation,
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
}

/// Informational news item; consumed by the dashboard, not by scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsFlash {
    pub id: u64,
    pub headline: String,
    pub sentiment: Sentiment,
    pub impact: ImpactLevel,
    pub category: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub market_reaction: String,
}
