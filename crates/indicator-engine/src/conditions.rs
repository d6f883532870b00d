use signal_core::{CandlePattern, CandleType, IndicatorBundle, MarketConditions, Trend};

use crate::engine::{round1, round2};

/// Classifies the indicator bundle into trend / strength / momentum plus a
/// single-candle descriptor.
pub struct ConditionAnalyzer;

impl ConditionAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, ind: &IndicatorBundle) -> MarketConditions {
        let close = ind.ohlc.close;
        let open = ind.ohlc.open;
        let high = ind.ohlc.high;
        let low = ind.ohlc.low;

        let body_size = if open > 0.0 {
            (close - open).abs() / open * 100.0
        } else {
            0.0
        };
        let body_top = close.max(open);
        let body_bottom = close.min(open);
        let upper_wick = if body_top > 0.0 {
            (high - body_top) / body_top * 100.0
        } else {
            0.0
        };
        let lower_wick = if body_bottom > 0.0 {
            (body_bottom - low) / body_bottom * 100.0
        } else {
            0.0
        };

        // First match wins: MA alignment beats raw candle direction.
        let trend = if ind.sma20 > ind.sma50 && close > ind.sma20 {
            if ind.rsi > 50.0 {
                Trend::StrongBullish
            } else {
                Trend::Bullish
            }
        } else if ind.sma20 < ind.sma50 && close < ind.sma20 {
            if ind.rsi < 50.0 {
                Trend::StrongBearish
            } else {
                Trend::Bearish
            }
        } else if close > open && body_size > 0.5 {
            Trend::Bullish
        } else if close < open && body_size > 0.5 {
            Trend::Bearish
        } else {
            Trend::Sideways
        };

        let mut strength: f64 = 50.0;
        if ind.rsi > 70.0 {
            strength += 20.0;
        } else if ind.rsi > 60.0 {
            strength += 10.0;
        } else if ind.rsi < 30.0 {
            // Oversold bounce potential counts as strength too.
            strength += 20.0;
        } else if ind.rsi < 40.0 {
            strength += 10.0;
        }
        if ind.volume_ratio > 1.5 {
            strength += 15.0;
        } else if ind.volume_ratio > 1.2 {
            strength += 10.0;
        }
        if ind.macd.histogram > 0.0 {
            strength += 10.0;
        }
        if ind.bollinger.position > 80.0 {
            strength += 5.0;
        } else if ind.bollinger.position < 20.0 {
            strength += 10.0;
        }
        if ind.volatility < 15.0 {
            strength -= 5.0;
        } else if ind.volatility > 25.0 {
            strength += 5.0;
        }
        let strength = strength.clamp(30.0, 95.0);

        let price_change = if open > 0.0 {
            (close - open) / open * 100.0
        } else {
            0.0
        };
        let mut momentum = 50.0 + price_change * 10.0;
        if ind.macd.line > ind.macd.signal {
            momentum += 10.0;
        } else {
            momentum -= 10.0;
        }
        if ind.volume_ratio > 1.0 {
            momentum += ind.volume_ratio * 5.0;
        }
        let momentum = momentum.clamp(20.0, 90.0);

        let candle_kind = if close > open {
            CandleType::Bullish
        } else if close < open {
            CandleType::Bearish
        } else {
            CandleType::Doji
        };

        MarketConditions {
            trend,
            strength: round1(strength),
            momentum: round1(momentum),
            candle_pattern: CandlePattern {
                kind: candle_kind,
                body_size: round2(body_size),
                upper_wick: round2(upper_wick),
                lower_wick: round2(lower_wick),
            },
        }
    }
}

impl Default for ConditionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
