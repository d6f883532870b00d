use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use tokio::sync::watch;
use tracing::{info, warn};

use indicator_engine::{ConditionAnalyzer, IndicatorEngine};
use notifier::signal_message;
use signal_core::{
    flash_message, next_expiry_thursday, rule_based_sentiment, Broadcaster, ChainEntry,
    ChainSource, ImpactLevel, MarketSentiment, MarketSnapshot, NewsFlash, Noise, Notifier,
    QuoteSource, SentimentSource, SessionClock, SessionState, TradeRecommendation,
};
use signal_generator::{GeneratorConfig, SignalContext, SignalGenerator};
use signal_store::SignalStore;
use strategy_selector::StrategySelector;
use trade_monitor::TradeMonitor;

use crate::EngineConfig;

/// External collaborators, injected behind traits so ticks are testable
/// without any network.
pub struct EngineDeps {
    pub quotes: Arc<dyn QuoteSource>,
    pub chain: Arc<dyn ChainSource>,
    pub sentiment: Arc<dyn SentimentSource>,
    pub notifier: Arc<dyn Notifier>,
    pub broadcaster: Arc<dyn Broadcaster>,
}

/// The sequential tick pipeline. One tick fetches (with fallbacks), computes
/// indicators and conditions, scores strategies and signals, re-marks open
/// trades and broadcasts the result. No error escapes a tick.
pub struct SignalEngine {
    deps: EngineDeps,
    store: Arc<SignalStore>,
    clock: SessionClock,
    engine: IndicatorEngine,
    analyzer: ConditionAnalyzer,
    selector: StrategySelector,
    generator: SignalGenerator,
    monitor: TradeMonitor,
    noise: Noise,
    config: EngineConfig,
}

impl SignalEngine {
    pub fn new(
        config: EngineConfig,
        deps: EngineDeps,
        store: Arc<SignalStore>,
        clock: SessionClock,
    ) -> Self {
        let noise = match config.noise_seed {
            Some(seed) => Noise::seeded(seed),
            None => Noise::from_entropy(),
        };
        let generator = SignalGenerator::new(GeneratorConfig {
            min_probability: config.min_probability,
            candidates_per_tick: config.candidates_per_tick,
            max_signals: config.max_signals,
        });
        Self {
            deps,
            store,
            clock,
            engine: IndicatorEngine::new(),
            analyzer: ConditionAnalyzer::new(),
            selector: StrategySelector::new(),
            generator,
            monitor: TradeMonitor::new(),
            noise,
            config,
        }
    }

    /// Tick until the shutdown channel fires. The in-flight tick always
    /// finishes; only the wait between ticks is interruptible.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            open_interval = self.config.open_interval_secs,
            closed_interval = self.config.closed_interval_secs,
            "signal engine started"
        );
        loop {
            self.run_tick(Utc::now()).await;
            let wait = self.interval_for(self.clock.state());
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown.changed() => {
                    info!("signal engine stopping");
                    break;
                }
            }
        }
    }

    /// Wait between ticks, re-derived from the session state every cycle.
    pub fn interval_for(&self, state: SessionState) -> Duration {
        if state.is_open() {
            Duration::from_secs(self.config.open_interval_secs)
        } else {
            Duration::from_secs(self.config.closed_interval_secs)
        }
    }

    /// One full pipeline pass. Every external call degrades to cached or
    /// synthetic data; the tick itself cannot fail.
    pub async fn run_tick(&mut self, now: DateTime<Utc>) {
        let session = self.clock.state_at(now);
        let today = self.clock.local_date_at(now);
        let local_hour = self.clock.local_hour_at(now);

        let snapshot = self.fetch_snapshot(session).await;
        let chain = self.fetch_chain(snapshot.price, today).await;

        let indicators = self.engine.compute(&snapshot, &mut self.noise);
        let conditions = self.analyzer.analyze(&indicators);
        let strategies = self.selector.select(
            &indicators,
            &conditions,
            session,
            self.clock.in_closing_window_at(now),
        );
        self.store.set_indicators(indicators.clone());
        self.store.set_conditions(conditions.clone());
        self.store.set_strategies(strategies.clone());

        let sentiment = match self.deps.sentiment.classify(&snapshot, &chain).await {
            Ok(sentiment) => sentiment,
            Err(err) => {
                warn!(%err, "sentiment classifier failed, using local rules");
                rule_based_sentiment(&snapshot)
            }
        };
        self.store.set_sentiment(sentiment.clone());
        if let Some(flash) = news_from_sentiment(&sentiment, &snapshot, now) {
            let stored = self.store.add_news(flash);
            self.deps.broadcaster.publish(
                "news_flash",
                serde_json::to_value(&stored).unwrap_or_default(),
            );
        }

        if session == SessionState::Open {
            let ctx = SignalContext {
                price: snapshot.price,
                chain: &chain,
                session,
                local_hour,
                today,
                now,
            };
            let fresh = self
                .generator
                .candidates(&indicators, &conditions, &strategies, &ctx, &mut self.noise);
            for signal in self.store.add_signals(fresh) {
                self.deps.broadcaster.publish(
                    "new_signal",
                    serde_json::to_value(&signal).unwrap_or_default(),
                );
                if signal.win_probability >= self.config.notify_min_probability {
                    // Fire-and-forget: a slow messaging endpoint must not
                    // hold up the next tick.
                    let notifier = Arc::clone(&self.deps.notifier);
                    let store = Arc::clone(&self.store);
                    let message = signal_message(&signal);
                    let id = signal.id;
                    tokio::spawn(async move {
                        match notifier.broadcast(&message).await {
                            Ok(()) => store.mark_notified(id),
                            Err(err) => warn!(id, %err, "signal push failed"),
                        }
                    });
                }
            }
        }

        let alerts = self
            .monitor
            .check_trades(&self.store, snapshot.price, now, &mut self.noise);
        if !alerts.is_empty() {
            let notifier = Arc::clone(&self.deps.notifier);
            let broadcaster = Arc::clone(&self.deps.broadcaster);
            tokio::spawn(async move {
                TradeMonitor::deliver(&alerts, notifier.as_ref(), broadcaster.as_ref()).await;
            });
        }

        self.deps.broadcaster.publish(
            "market_update",
            json!({
                "market_data": snapshot,
                "indicators": indicators,
                "conditions": conditions,
                "sentiment": sentiment,
                "session": session,
                "flash": flash_message(&sentiment, session),
            }),
        );
    }

    /// Live quote, else the last good snapshot restamped with the current
    /// session, else the neutral hardcoded quote.
    async fn fetch_snapshot(&self, session: SessionState) -> MarketSnapshot {
        match self.deps.quotes.fetch().await {
            Ok(snapshot) => {
                self.store.set_snapshot(snapshot.clone());
                snapshot
            }
            Err(err) => {
                warn!(%err, "quote fetch failed, falling back");
                match self.store.snapshot() {
                    Some(mut cached) => {
                        cached.session = session;
                        cached
                    }
                    None => {
                        let fallback = MarketSnapshot::fallback(session);
                        self.store.set_snapshot(fallback.clone());
                        fallback
                    }
                }
            }
        }
    }

    /// Live chain, else the cached one, else synthetic strikes around spot.
    async fn fetch_chain(&self, price: f64, today: NaiveDate) -> Vec<ChainEntry> {
        match self.deps.chain.fetch().await {
            Ok(chain) => {
                self.store.set_chain(chain.clone());
                chain
            }
            Err(err) => {
                warn!(%err, "chain fetch failed, falling back");
                let cached = self.store.chain();
                if !cached.is_empty() {
                    return cached;
                }
                let synthetic = synthetic_chain(price, today);
                self.store.set_chain(synthetic.clone());
                synthetic
            }
        }
    }
}

/// Strongly directional sentiment becomes a dashboard news flash.
pub(crate) fn news_from_sentiment(
    sentiment: &MarketSentiment,
    snapshot: &MarketSnapshot,
    now: DateTime<Utc>,
) -> Option<NewsFlash> {
    let headline = match sentiment.recommendation {
        TradeRecommendation::BuyCall => {
            format!("NIFTY strength builds at {:.2}", snapshot.price)
        }
        TradeRecommendation::BuyPut => {
            format!("NIFTY under pressure at {:.2}", snapshot.price)
        }
        _ => return None,
    };
    let impact = if snapshot.change_percent.abs() >= 1.0 {
        ImpactLevel::High
    } else if snapshot.change_percent.abs() >= 0.5 {
        ImpactLevel::Medium
    } else {
        ImpactLevel::Low
    };
    Some(NewsFlash {
        id: 0,
        headline,
        sentiment: sentiment.sentiment,
        impact,
        category: "market".to_string(),
        source: "Signal Engine".to_string(),
        timestamp: now,
        market_reaction: sentiment.reasoning.clone(),
    })
}

/// ATM and two strikes either side, premiums decaying with distance from
/// spot. Used only when no live or cached chain exists.
pub(crate) fn synthetic_chain(price: f64, today: NaiveDate) -> Vec<ChainEntry> {
    let atm = (price / 50.0).round() * 50.0;
    let expiry = next_expiry_thursday(today).format("%d-%b-%Y").to_string();
    [-100.0, -50.0, 0.0, 50.0, 100.0]
        .iter()
        .map(|offset| {
            let strike = atm + offset;
            let distance = (strike - price).abs();
            let time_value = (90.0 - 0.35 * distance).max(5.0);
            let volume = (1500.0 - 4.0 * distance).max(300.0) as i64;
            ChainEntry {
                strike_price: strike,
                call_price: round2((price - strike).max(0.0) + time_value),
                call_volume: volume,
                put_price: round2((strike - price).max(0.0) + time_value),
                put_volume: volume,
                expiry_date: expiry.clone(),
            }
        })
        .collect()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
