use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use signal_core::{
    ActiveTrade, ChainEntry, IndicatorBundle, MarketConditions, MarketSentiment, MarketSnapshot,
    NewsFlash, SignalError, TradeStatus, TradingSignal, TradingStrategy,
};

/// Signals older than this no longer count as actionable.
const SIGNAL_TTL_HOURS: i64 = 24;

/// News is display-only; keep a bounded backlog.
const NEWS_BACKLOG: usize = 50;

#[derive(Default)]
struct Inner {
    signals: Vec<TradingSignal>,
    next_signal_id: u64,
    trades: Vec<ActiveTrade>,
    next_trade_id: u64,
    news: Vec<NewsFlash>,
    next_news_id: u64,
    snapshot: Option<MarketSnapshot>,
    chain: Vec<ChainEntry>,
    indicators: Option<IndicatorBundle>,
    conditions: Option<MarketConditions>,
    strategies: Vec<TradingStrategy>,
    sentiment: Option<MarketSentiment>,
}

/// In-memory state shared between the engine loop, the trade monitor and the
/// HTTP layer. Signals are append-only; trades transition ACTIVE -> terminal
/// exactly once; the per-tick caches are overwritten wholesale.
pub struct SignalStore {
    inner: Mutex<Inner>,
}

impl SignalStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a panic mid-update; the state is plain data,
        // so continuing with it is still sound.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // --- signals ---------------------------------------------------------

    /// Store a signal, assigning the next monotonic id.
    pub fn add_signal(&self, mut signal: TradingSignal) -> TradingSignal {
        let mut inner = self.lock();
        inner.next_signal_id += 1;
        signal.id = inner.next_signal_id;
        inner.signals.push(signal.clone());
        debug!(id = signal.id, direction = signal.direction.label(), "signal stored");
        signal
    }

    pub fn add_signals(&self, signals: Vec<TradingSignal>) -> Vec<TradingSignal> {
        signals.into_iter().map(|s| self.add_signal(s)).collect()
    }

    pub fn signal(&self, id: u64) -> Option<TradingSignal> {
        self.lock().signals.iter().find(|s| s.id == id).cloned()
    }

    /// All stored signals, newest first.
    pub fn signals(&self) -> Vec<TradingSignal> {
        let inner = self.lock();
        let mut out = inner.signals.clone();
        out.reverse();
        out
    }

    /// Signals created within the last 24 hours, newest first.
    pub fn active_signals(&self, now: DateTime<Utc>) -> Vec<TradingSignal> {
        let cutoff = now - Duration::hours(SIGNAL_TTL_HOURS);
        let inner = self.lock();
        let mut out: Vec<TradingSignal> = inner
            .signals
            .iter()
            .filter(|s| s.created_at > cutoff)
            .cloned()
            .collect();
        out.reverse();
        out
    }

    /// Active signals at or above a win-probability floor, newest first.
    pub fn signals_with_min_probability(
        &self,
        min_probability: f64,
        now: DateTime<Utc>,
    ) -> Vec<TradingSignal> {
        self.active_signals(now)
            .into_iter()
            .filter(|s| s.win_probability >= min_probability)
            .collect()
    }

    /// Flip the one mutable field a stored signal has.
    pub fn mark_notified(&self, id: u64) {
        let mut inner = self.lock();
        if let Some(signal) = inner.signals.iter_mut().find(|s| s.id == id) {
            signal.notified = true;
        }
    }

    // --- trades ----------------------------------------------------------

    /// Open a position against an existing signal.
    pub fn open_trade(
        &self,
        signal_id: u64,
        user_id: &str,
        entry_price: f64,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<ActiveTrade, SignalError> {
        if user_id.trim().is_empty() {
            return Err(SignalError::validation("user_id must not be empty"));
        }
        if quantity == 0 {
            return Err(SignalError::validation("quantity must be positive"));
        }
        if entry_price <= 0.0 {
            return Err(SignalError::validation("entry_price must be positive"));
        }

        let mut inner = self.lock();
        if !inner.signals.iter().any(|s| s.id == signal_id) {
            return Err(SignalError::not_found(format!("signal {signal_id}")));
        }

        inner.next_trade_id += 1;
        let trade = ActiveTrade {
            id: inner.next_trade_id,
            signal_id,
            user_id: user_id.to_string(),
            entry_price,
            current_price: entry_price,
            quantity,
            entry_time: now,
            status: TradeStatus::Active,
            pnl: 0.0,
            pnl_percent: 0.0,
            target_hit: false,
            sl_hit: false,
            alerts_sent: HashSet::new(),
            last_alert_at: None,
        };
        inner.trades.push(trade.clone());
        debug!(id = trade.id, signal_id, user_id, "trade opened");
        Ok(trade)
    }

    pub fn trade(&self, id: u64) -> Option<ActiveTrade> {
        self.lock().trades.iter().find(|t| t.id == id).cloned()
    }

    pub fn active_trades(&self) -> Vec<ActiveTrade> {
        self.lock()
            .trades
            .iter()
            .filter(|t| t.status == TradeStatus::Active)
            .cloned()
            .collect()
    }

    /// All of a user's trades with the originating signal, newest first.
    /// The signal side is an Option: trades outlive signal relevance.
    pub fn user_trades(&self, user_id: &str) -> Vec<(ActiveTrade, Option<TradingSignal>)> {
        let inner = self.lock();
        let mut out: Vec<(ActiveTrade, Option<TradingSignal>)> = inner
            .trades
            .iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| {
                let signal = inner.signals.iter().find(|s| s.id == t.signal_id).cloned();
                (t.clone(), signal)
            })
            .collect();
        out.reverse();
        out
    }

    /// Move an active trade to a terminal status. The transition is one-way;
    /// a second exit attempt is rejected.
    pub fn exit_trade(
        &self,
        trade_id: u64,
        status: TradeStatus,
        exit_price: f64,
    ) -> Result<ActiveTrade, SignalError> {
        if !status.is_terminal() {
            return Err(SignalError::validation("exit status must be terminal"));
        }
        let mut inner = self.lock();
        let trade = inner
            .trades
            .iter_mut()
            .find(|t| t.id == trade_id)
            .ok_or_else(|| SignalError::not_found(format!("trade {trade_id}")))?;
        if trade.status.is_terminal() {
            return Err(SignalError::validation(format!(
                "trade {trade_id} already closed"
            )));
        }
        trade.status = status;
        trade.current_price = exit_price;
        trade.pnl = (exit_price - trade.entry_price) * f64::from(trade.quantity);
        trade.pnl_percent = if trade.entry_price > 0.0 {
            (exit_price - trade.entry_price) / trade.entry_price * 100.0
        } else {
            0.0
        };
        Ok(trade.clone())
    }

    /// Run the monitor's mutation pass over every active trade, with the
    /// originating signal alongside. Writes land under the same lock.
    pub fn update_active_trades<F>(&self, mut update: F)
    where
        F: FnMut(&mut ActiveTrade, Option<&TradingSignal>),
    {
        let mut inner = self.lock();
        let Inner {
            signals, trades, ..
        } = &mut *inner;
        for trade in trades.iter_mut().filter(|t| t.status == TradeStatus::Active) {
            let signal = signals.iter().find(|s| s.id == trade.signal_id);
            update(trade, signal);
        }
    }

    // --- per-tick caches -------------------------------------------------

    pub fn set_snapshot(&self, snapshot: MarketSnapshot) {
        self.lock().snapshot = Some(snapshot);
    }

    pub fn snapshot(&self) -> Option<MarketSnapshot> {
        self.lock().snapshot.clone()
    }

    pub fn set_chain(&self, chain: Vec<ChainEntry>) {
        self.lock().chain = chain;
    }

    pub fn chain(&self) -> Vec<ChainEntry> {
        self.lock().chain.clone()
    }

    pub fn set_indicators(&self, indicators: IndicatorBundle) {
        self.lock().indicators = Some(indicators);
    }

    pub fn indicators(&self) -> Option<IndicatorBundle> {
        self.lock().indicators.clone()
    }

    pub fn set_conditions(&self, conditions: MarketConditions) {
        self.lock().conditions = Some(conditions);
    }

    pub fn conditions(&self) -> Option<MarketConditions> {
        self.lock().conditions.clone()
    }

    pub fn set_strategies(&self, strategies: Vec<TradingStrategy>) {
        self.lock().strategies = strategies;
    }

    pub fn strategies(&self) -> Vec<TradingStrategy> {
        self.lock().strategies.clone()
    }

    pub fn set_sentiment(&self, sentiment: MarketSentiment) {
        self.lock().sentiment = Some(sentiment);
    }

    pub fn sentiment(&self) -> Option<MarketSentiment> {
        self.lock().sentiment.clone()
    }

    // --- news ------------------------------------------------------------

    /// Store a news flash, assigning the next id and trimming the backlog.
    pub fn add_news(&self, mut flash: NewsFlash) -> NewsFlash {
        let mut inner = self.lock();
        inner.next_news_id += 1;
        flash.id = inner.next_news_id;
        inner.news.push(flash.clone());
        if inner.news.len() > NEWS_BACKLOG {
            let excess = inner.news.len() - NEWS_BACKLOG;
            inner.news.drain(..excess);
        }
        flash
    }

    /// Most recent news first.
    pub fn recent_news(&self, limit: usize) -> Vec<NewsFlash> {
        let inner = self.lock();
        inner.news.iter().rev().take(limit).cloned().collect()
    }
}

impl Default for SignalStore {
    fn default() -> Self {
        Self::new()
    }
}
