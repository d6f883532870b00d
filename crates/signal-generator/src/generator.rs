use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use indicator_engine::{ConditionAnalyzer, IndicatorEngine};
use signal_core::{
    next_expiry_thursday, ChainEntry, Direction, IndicatorBundle, MarketConditions, Noise,
    SessionState, StrategyKind, TradingSignal, TradingStrategy,
};

use crate::probability::{ProbabilityInput, ProbabilityScorer};

/// Tunables for candidate generation. The defaults mirror the production
/// configuration; treat them as behavior, not as values to tune casually.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Candidates below this win-probability are discarded outright.
    pub min_probability: f64,
    /// Parameter-jittered indicator variants scored per tick.
    pub candidates_per_tick: usize,
    /// Retained top-N after filtering.
    pub max_signals: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            min_probability: 75.0,
            candidates_per_tick: 4,
            max_signals: 3,
        }
    }
}

/// Per-tick context the generator needs beyond the indicator bundle.
pub struct SignalContext<'a> {
    pub price: f64,
    pub chain: &'a [ChainEntry],
    pub session: SessionState,
    pub local_hour: u32,
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
}

/// Builds directional trade candidates from the per-tick analysis and keeps
/// the highest-probability few. Signal ids are assigned by the store, not
/// here; generated signals carry id 0 until stored.
pub struct SignalGenerator {
    engine: IndicatorEngine,
    analyzer: ConditionAnalyzer,
    scorer: ProbabilityScorer,
    config: GeneratorConfig,
}

impl SignalGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            engine: IndicatorEngine::new(),
            analyzer: ConditionAnalyzer::new(),
            scorer: ProbabilityScorer::new(),
            config,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Score several jittered variants of the tick's bundle and keep the top
    /// few by (win_probability, trade_score) descending.
    pub fn candidates(
        &self,
        ind: &IndicatorBundle,
        conditions: &MarketConditions,
        strategies: &[TradingStrategy],
        ctx: &SignalContext<'_>,
        noise: &mut Noise,
    ) -> Vec<TradingSignal> {
        let mut kept = Vec::new();
        for i in 0..self.config.candidates_per_tick {
            let signal = if i == 0 {
                // The first candidate is always the unjittered read.
                self.build_signal(ind, conditions, strategies, ctx)
            } else {
                let jittered = self.engine.jitter(ind, noise);
                let jittered_conditions = self.analyzer.analyze(&jittered);
                self.build_signal(&jittered, &jittered_conditions, strategies, ctx)
            };
            if signal.win_probability >= self.config.min_probability {
                kept.push(signal);
            }
        }

        kept.sort_by(|a, b| {
            (b.win_probability, b.trade_score)
                .partial_cmp(&(a.win_probability, a.trade_score))
                .unwrap_or(Ordering::Equal)
        });
        kept.truncate(self.config.max_signals);
        kept
    }

    /// Build and score a single candidate from one indicator read.
    pub fn build_signal(
        &self,
        ind: &IndicatorBundle,
        conditions: &MarketConditions,
        strategies: &[TradingStrategy],
        ctx: &SignalContext<'_>,
    ) -> TradingSignal {
        let price = ctx.price;
        let open = ind.ohlc.open;

        // Direction vote. Ties fall through to PUT: CALL requires a strict
        // bullish majority.
        let mut bullish = 0;
        let mut bearish = 0;
        if conditions.trend.is_bullish() {
            bullish += 2;
        } else if conditions.trend.is_bearish() {
            bearish += 2;
        }
        if price > open {
            bullish += 1;
        } else {
            bearish += 1;
        }
        if ind.rsi < 35.0 {
            bullish += 2;
        } else if ind.rsi > 65.0 {
            bearish += 2;
        }
        if ind.macd.histogram > 0.0 {
            bullish += 1;
        } else {
            bearish += 1;
        }
        if ind.bollinger.position < 25.0 {
            bullish += 1;
        } else if ind.bollinger.position > 75.0 {
            bearish += 1;
        }
        if ind.volume_ratio > 1.2 {
            if price > open {
                bullish += 1;
            } else {
                bearish += 1;
            }
        }
        let direction = if bullish > bearish {
            Direction::Call
        } else {
            Direction::Put
        };

        // Strike: round to the nearest 50, shift one step OTM when price
        // presses against the nearest technical level.
        let base_strike = (price / 50.0).round() * 50.0;
        let strike = match direction {
            Direction::Call => {
                if price > ind.levels.resistance_1 * 0.995 {
                    base_strike + 50.0
                } else {
                    base_strike
                }
            }
            Direction::Put => {
                if price < ind.levels.support_1 * 1.005 {
                    base_strike - 50.0
                } else {
                    base_strike
                }
            }
        };

        let mut confidence = 60.0 + 8.0 * (bullish as f64 - bearish as f64).abs();
        if conditions.strength > 75.0 {
            confidence += 10.0;
        }
        if conditions.momentum > 70.0 {
            confidence += 8.0;
        }
        if ind.volume_ratio > 1.5 {
            confidence += 5.0;
        }
        if ind.macd.histogram.abs() > 0.5 {
            confidence += 5.0;
        }
        let confidence = confidence.clamp(60.0, 95.0);

        // Attribution: best recommended strategy, else best overall. The
        // selector hands us a confidence-sorted list.
        let attributed = strategies
            .iter()
            .find(|s| s.recommended)
            .or_else(|| strategies.first());
        let (kind, strategy_reasoning, holding_period) = match attributed {
            Some(s) => (s.kind, s.reasoning.clone(), s.holding_period.clone()),
            None => (
                StrategyKind::Intraday,
                String::new(),
                StrategyKind::Intraday.holding_period().to_string(),
            ),
        };

        // Premium model and premium-space target/stop.
        let intrinsic = match direction {
            Direction::Call => (price - strike).max(0.0),
            Direction::Put => (strike - price).max(0.0),
        };
        let time_value = 15.0 + ind.volatility * 2.0;
        let distance_penalty = 0.1 * (strike - price).abs();
        let volatility_premium = 1.5 * ind.volatility;
        let premium = intrinsic + time_value + distance_penalty + volatility_premium;

        let target = premium * (1.8 + ind.volatility / 50.0) * kind.target_multiplier();
        let stop = premium * (0.3 + ind.volatility / 100.0) * kind.stop_multiplier();
        let target = round2(target);
        let stop = round2(stop);

        let reasoning = self.compose_reasoning(direction, ind, conditions, price);

        let outcome = self.scorer.score(&ProbabilityInput {
            direction,
            ind,
            conditions,
            chain: ctx.chain,
            strike,
            target,
            stop,
            session: ctx.session,
            local_hour: ctx.local_hour,
            historical_accuracy: None,
        });

        TradingSignal {
            id: 0,
            direction,
            strike_price: strike,
            target_price: target,
            stop_loss: stop,
            confidence,
            reasoning,
            expiry_date: next_expiry_thursday(ctx.today),
            created_at: ctx.now,
            notified: false,
            strategy: kind,
            strategy_reasoning,
            holding_period,
            risk_level: kind.risk_level(),
            win_probability: outcome.win_probability,
            probability_factors: outcome.factors,
            risk_reward: outcome.risk_reward,
            trade_score: outcome.trade_score,
            scores: outcome.breakdown,
        }
    }

    /// Up to three qualifying technical reasons in fixed order, then the
    /// ATR/volatility summary. The composition order is load-bearing for
    /// reproducible output.
    fn compose_reasoning(
        &self,
        direction: Direction,
        ind: &IndicatorBundle,
        conditions: &MarketConditions,
        price: f64,
    ) -> String {
        let mut reasons: Vec<String> = Vec::new();
        match direction {
            Direction::Call => {
                if ind.rsi < 40.0 {
                    reasons.push(format!("RSI oversold at {:.1}", ind.rsi));
                }
                if price > ind.sma20 {
                    reasons.push("Price above SMA20".to_string());
                }
                if ind.macd.histogram > 0.0 {
                    reasons.push("MACD bullish crossover".to_string());
                }
                if ind.bollinger.position < 30.0 {
                    reasons.push("Near Bollinger lower band".to_string());
                }
            }
            Direction::Put => {
                if ind.rsi > 60.0 {
                    reasons.push(format!("RSI overbought at {:.1}", ind.rsi));
                }
                if price < ind.sma20 {
                    reasons.push("Price below SMA20".to_string());
                }
                if ind.macd.histogram < 0.0 {
                    reasons.push("MACD bearish momentum".to_string());
                }
                if ind.bollinger.position > 70.0 {
                    reasons.push("Near Bollinger upper band".to_string());
                }
            }
        }
        if ind.volume_ratio > 1.3 {
            reasons.push("High volume confirmation".to_string());
        }
        if ind.volatility > 20.0 {
            reasons.push("Elevated volatility".to_string());
        }
        let candle = &conditions.candle_pattern;
        if candle.body_size > 1.0 {
            let kind = match candle.kind {
                signal_core::CandleType::Bullish => "bullish",
                signal_core::CandleType::Bearish => "bearish",
                signal_core::CandleType::Doji => "doji",
            };
            reasons.push(format!("Strong {} candle", kind));
        }

        let summary = format!("ATR: {:.1}%, Vol: {:.1}%", ind.atr, ind.volatility);
        if reasons.is_empty() {
            summary
        } else {
            reasons.truncate(3);
            format!("{}. {}", reasons.join(". "), summary)
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
