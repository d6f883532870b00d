use signal_core::{
    ChainEntry, Direction, IndicatorBundle, MarketConditions, ScoreBreakdown, SessionState,
};

const TECHNICAL_CAP: f64 = 25.0;
const VOLUME_CAP: f64 = 20.0;
const VOLATILITY_CAP: f64 = 15.0;
const MARKET_CAP: f64 = 15.0;
const OPTIONS_CAP: f64 = 10.0;
const RISK_REWARD_CAP: f64 = 10.0;
const TIMING_CAP: f64 = 5.0;

const MAX_POSSIBLE: f64 = TECHNICAL_CAP
    + VOLUME_CAP
    + VOLATILITY_CAP
    + MARKET_CAP
    + OPTIONS_CAP
    + RISK_REWARD_CAP
    + TIMING_CAP;

/// Everything the rubric needs to score one candidate.
pub struct ProbabilityInput<'a> {
    pub direction: Direction,
    pub ind: &'a IndicatorBundle,
    pub conditions: &'a MarketConditions,
    pub chain: &'a [ChainEntry],
    pub strike: f64,
    pub target: f64,
    pub stop: f64,
    pub session: SessionState,
    pub local_hour: u32,
    /// Prior hit-rate for this signal family, blended 80/20 when present.
    pub historical_accuracy: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct ProbabilityOutcome {
    /// Clamped to [10, 95].
    pub win_probability: f64,
    /// Qualifying factor descriptions in rubric evaluation order, top 5.
    pub factors: Vec<String>,
    pub trade_score: f64,
    pub risk_reward: f64,
    pub breakdown: ScoreBreakdown,
}

/// Weighted multi-factor win-probability rubric. Seven capped factor groups
/// sum to a 0-100 score; the emitted factor list preserves evaluation order
/// (technical, volume, volatility, market, options, risk:reward, timing).
///
/// Not a statistically validated probability; a heuristic confidence score.
pub struct ProbabilityScorer;

impl ProbabilityScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, input: &ProbabilityInput<'_>) -> ProbabilityOutcome {
        let mut factors: Vec<String> = Vec::new();
        let ind = input.ind;
        let conditions = input.conditions;
        let is_call = input.direction == Direction::Call;

        // Technical alignment (cap 25).
        let mut technical: f64 = 0.0;
        match input.direction {
            Direction::Call => {
                if ind.rsi < 40.0 {
                    technical += 8.0;
                    factors.push(format!("RSI favourable at {:.1}", ind.rsi));
                } else if ind.rsi < 50.0 {
                    technical += 5.0;
                    factors.push(format!("RSI mildly supportive at {:.1}", ind.rsi));
                }
            }
            Direction::Put => {
                if ind.rsi > 60.0 {
                    technical += 8.0;
                    factors.push(format!("RSI favourable at {:.1}", ind.rsi));
                } else if ind.rsi > 50.0 {
                    technical += 5.0;
                    factors.push(format!("RSI mildly supportive at {:.1}", ind.rsi));
                }
            }
        }
        if (is_call && ind.macd.histogram > 0.0) || (!is_call && ind.macd.histogram < 0.0) {
            technical += 6.0;
            factors.push("MACD histogram aligned with direction".to_string());
        }
        let ma_aligned = if is_call {
            ind.ohlc.close > ind.sma20 && ind.sma20 > ind.sma50
        } else {
            ind.ohlc.close < ind.sma20 && ind.sma20 < ind.sma50
        };
        if ma_aligned {
            technical += 6.0;
            factors.push("Moving averages stacked with the trade".to_string());
        }
        if (is_call && ind.bollinger.position < 30.0)
            || (!is_call && ind.bollinger.position > 70.0)
        {
            technical += 5.0;
            factors.push("Entry near the favourable Bollinger edge".to_string());
        }
        let technical = technical.min(TECHNICAL_CAP);

        // Volume (cap 20).
        let mut volume: f64 = 0.0;
        if ind.volume_ratio > 1.5 {
            volume += 15.0;
            factors.push(format!("Exceptional volume at {:.2}x average", ind.volume_ratio));
        } else if ind.volume_ratio > 1.2 {
            volume += 10.0;
            factors.push(format!("Strong volume at {:.2}x average", ind.volume_ratio));
        } else if ind.volume_ratio > 0.8 {
            volume += 5.0;
            factors.push("Adequate volume participation".to_string());
        }
        let volume = volume.min(VOLUME_CAP);

        // Volatility (cap 15).
        let mut volatility: f64 = 0.0;
        if (15.0..=30.0).contains(&ind.volatility) {
            volatility += 12.0;
            factors.push("Volatility in the optimal band".to_string());
        } else if (10.0..=35.0).contains(&ind.volatility) {
            volatility += 8.0;
            factors.push("Volatility workable".to_string());
        } else if ind.volatility > 35.0 {
            volatility += 5.0;
            factors.push("High-volatility regime".to_string());
        }
        let volatility = volatility.min(VOLATILITY_CAP);

        // Market conditions (cap 15).
        let mut market: f64 = 0.0;
        if (is_call && conditions.trend.is_bullish())
            || (!is_call && conditions.trend.is_bearish())
        {
            market += 8.0;
            factors.push("Trend aligned with trade direction".to_string());
        }
        if conditions.strength > 70.0 {
            market += 4.0;
            factors.push(format!("Strong market conditions ({:.0})", conditions.strength));
        } else if conditions.strength > 60.0 {
            market += 2.0;
        }
        if (is_call && conditions.momentum > 55.0) || (!is_call && conditions.momentum < 45.0) {
            market += 3.0;
            factors.push("Momentum behind the trade".to_string());
        }
        let market = market.min(MARKET_CAP);

        // Options liquidity / premium (cap 10).
        let mut options: f64 = 0.0;
        if let Some(entry) = nearest_strike(input.chain, input.strike) {
            let (side_volume, side_premium) = match input.direction {
                Direction::Call => (entry.call_volume, entry.call_price),
                Direction::Put => (entry.put_volume, entry.put_price),
            };
            if side_volume > 1000 {
                options += 5.0;
                factors.push(format!("Liquid strike ({} contracts)", side_volume));
            } else if side_volume > 500 {
                options += 3.0;
                factors.push("Tradeable strike liquidity".to_string());
            }
            if side_premium > 10.0 {
                options += 3.0;
                factors.push("Healthy option premium".to_string());
            }
        }
        let options = options.min(OPTIONS_CAP);

        // Risk:reward (cap 10).
        let denominator = input.strike - input.stop;
        let risk_reward = if denominator.abs() > f64::EPSILON {
            (input.target - input.strike) / denominator
        } else {
            0.0
        };
        let mut rr_points: f64 = 0.0;
        if risk_reward >= 2.0 {
            rr_points += 8.0;
            factors.push(format!("Excellent risk:reward at {:.2}", risk_reward));
        } else if risk_reward >= 1.5 {
            rr_points += 6.0;
            factors.push(format!("Good risk:reward at {:.2}", risk_reward));
        } else if risk_reward >= 1.0 {
            rr_points += 3.0;
            factors.push("Acceptable risk:reward".to_string());
        }
        let rr_points = rr_points.min(RISK_REWARD_CAP);

        // Timing (cap 5).
        let mut timing: f64 = 0.0;
        if input.session == SessionState::Open {
            if (10..=14).contains(&input.local_hour) {
                timing += 4.0;
                factors.push("Optimal trading hours".to_string());
            } else if (9..=15).contains(&input.local_hour) {
                timing += 2.0;
                factors.push("Regular trading hours".to_string());
            }
        }
        let timing = timing.min(TIMING_CAP);

        let total = technical + volume + volatility + market + options + rr_points + timing;
        let mut probability = 100.0 * total / MAX_POSSIBLE;
        if let Some(accuracy) = input.historical_accuracy {
            probability = probability * 0.8 + accuracy * 0.2;
        }
        let probability = round1(probability.clamp(10.0, 95.0));

        factors.truncate(5);

        ProbabilityOutcome {
            win_probability: probability,
            factors,
            trade_score: round1(total),
            risk_reward: round2(risk_reward),
            breakdown: ScoreBreakdown {
                technical: round1(technical / TECHNICAL_CAP * 100.0),
                volume: round1(volume / VOLUME_CAP * 100.0),
                volatility: round1(volatility / VOLATILITY_CAP * 100.0),
                market_conditions: round1(market / MARKET_CAP * 100.0),
            },
        }
    }
}

impl Default for ProbabilityScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Closest chain row within 25 points of the chosen strike.
fn nearest_strike(chain: &[ChainEntry], strike: f64) -> Option<&ChainEntry> {
    chain
        .iter()
        .filter(|e| (e.strike_price - strike).abs() <= 25.0)
        .min_by(|a, b| {
            let da = (a.strike_price - strike).abs();
            let db = (b.strike_price - strike).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
