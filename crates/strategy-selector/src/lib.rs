use std::cmp::Ordering;

use signal_core::{
    IndicatorBundle, MarketConditions, SessionState, StrategyKind, TradingStrategy, Trend,
};

/// Scores the four holding-horizon strategies against current conditions.
///
/// Each strategy accumulates additive rubric points; it is recommended when
/// the score crosses its fixed threshold, and its confidence is the score
/// capped at a per-strategy ceiling. The output is sorted descending by
/// confidence with a stable sort, so ties keep the fixed input order
/// (scalping, intraday, BTST, positional).
pub struct StrategySelector;

struct Rubric {
    score: f64,
    factors: Vec<&'static str>,
}

impl Rubric {
    fn new() -> Self {
        Self {
            score: 0.0,
            factors: Vec::new(),
        }
    }

    fn add(&mut self, points: f64, factor: &'static str) {
        self.score += points;
        self.factors.push(factor);
    }
}

impl StrategySelector {
    pub fn new() -> Self {
        Self
    }

    pub fn select(
        &self,
        ind: &IndicatorBundle,
        conditions: &MarketConditions,
        session: SessionState,
        in_closing_window: bool,
    ) -> Vec<TradingStrategy> {
        let mut strategies = vec![
            self.score_scalping(ind, conditions, session),
            self.score_intraday(ind, conditions, session),
            self.score_btst(ind, conditions, in_closing_window),
            self.score_positional(ind, conditions),
        ];
        // Stable sort: equal confidence preserves input order.
        strategies.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });
        strategies
    }

    fn score_scalping(
        &self,
        ind: &IndicatorBundle,
        conditions: &MarketConditions,
        session: SessionState,
    ) -> TradingStrategy {
        let mut rubric = Rubric::new();
        if session == SessionState::Open {
            if ind.volatility > 20.0 {
                rubric.add(25.0, "High volatility suits quick in-and-out trades");
            }
            if ind.volume_ratio > 1.3 {
                rubric.add(20.0, "Heavy volume provides tight fills");
            }
            if conditions.momentum < 35.0 || conditions.momentum > 65.0 {
                rubric.add(15.0, "Momentum skewed away from equilibrium");
            }
            if ind.rsi < 30.0 || ind.rsi > 70.0 {
                rubric.add(10.0, "RSI at an extreme, snap-back likely");
            }
        }
        // Scalping is meaningless off-session; score stays 0 when not open.

        self.build(
            StrategyKind::Scalping,
            rubric,
            50.0,
            95.0,
            vec![
                "Enter on a momentum burst with volume confirmation".to_string(),
                "Prefer ATM strikes for the tightest spreads".to_string(),
            ],
            vec![
                "Book within 5-30 minutes".to_string(),
                "Exit immediately if the move stalls".to_string(),
            ],
        )
    }

    fn score_intraday(
        &self,
        ind: &IndicatorBundle,
        conditions: &MarketConditions,
        session: SessionState,
    ) -> TradingStrategy {
        let mut rubric = Rubric::new();
        if conditions.trend != Trend::Sideways {
            rubric.add(20.0, "Directional trend in place");
        }
        if (10.0..=25.0).contains(&ind.volatility) {
            rubric.add(15.0, "Volatility in the workable band");
        }
        if ind.volume_ratio > 0.8 {
            rubric.add(15.0, "Participation at or above normal");
        }
        if conditions.strength > 60.0 {
            rubric.add(15.0, "Strong underlying conditions");
        }
        if (40.0..=70.0).contains(&ind.rsi) {
            rubric.add(10.0, "RSI in trend-following territory");
        }
        if session == SessionState::Open {
            rubric.add(10.0, "Live session");
        }

        self.build(
            StrategyKind::Intraday,
            rubric,
            45.0,
            90.0,
            vec![
                "Enter with the trend after the first hour settles".to_string(),
                "Size for a full-day hold".to_string(),
            ],
            vec![
                "Square off by 3:15 PM".to_string(),
                "Trail the stop behind 20-period support".to_string(),
            ],
        )
    }

    fn score_btst(
        &self,
        ind: &IndicatorBundle,
        conditions: &MarketConditions,
        in_closing_window: bool,
    ) -> TradingStrategy {
        let mut rubric = Rubric::new();
        if in_closing_window && conditions.trend.is_bullish() && conditions.momentum > 60.0 {
            rubric.add(25.0, "Late-session bullish momentum carrying into close");
        }
        if ind.bollinger.position > 60.0 {
            rubric.add(15.0, "Price riding the upper Bollinger half");
        }
        if ind.macd.histogram > 0.0 && conditions.momentum > 55.0 {
            rubric.add(20.0, "MACD expansion with momentum behind it");
        }
        if ind.volume_ratio > 1.1 {
            rubric.add(10.0, "Above-average closing volume");
        }
        if conditions.strength > 65.0 {
            rubric.add(10.0, "Market strength supports an overnight hold");
        }

        self.build(
            StrategyKind::Btst,
            rubric,
            40.0,
            85.0,
            vec![
                "Enter in the last two trading hours only".to_string(),
                "Pick slightly ITM strikes to limit overnight decay".to_string(),
            ],
            vec![
                "Sell in the first 30 minutes next session".to_string(),
                "Exit at open on any gap against the position".to_string(),
            ],
        )
    }

    fn score_positional(
        &self,
        ind: &IndicatorBundle,
        conditions: &MarketConditions,
    ) -> TradingStrategy {
        let mut rubric = Rubric::new();
        if conditions.trend.is_strong() {
            rubric.add(30.0, "Established strong trend");
        }
        if ind.sma20 > ind.sma50 && conditions.trend.is_bullish() {
            rubric.add(20.0, "Moving averages aligned with the bullish trend");
        }
        if (35.0..=65.0).contains(&ind.rsi) {
            rubric.add(15.0, "RSI leaves room to run");
        }
        if (55.0..=80.0).contains(&conditions.momentum) {
            rubric.add(15.0, "Sustained momentum without exhaustion");
        }
        if conditions.strength > 70.0 {
            rubric.add(10.0, "Broad strength across indicators");
        }

        self.build(
            StrategyKind::Positional,
            rubric,
            50.0,
            88.0,
            vec![
                "Enter on a strong daily close in trend direction".to_string(),
                "Use next-week expiry to reduce theta pressure".to_string(),
            ],
            vec![
                "Hold 3-10 days while the trend persists".to_string(),
                "Exit on a close across the 20-day average".to_string(),
            ],
        )
    }

    fn build(
        &self,
        kind: StrategyKind,
        rubric: Rubric,
        threshold: f64,
        cap: f64,
        entry_conditions: Vec<String>,
        exit_conditions: Vec<String>,
    ) -> TradingStrategy {
        let recommended = rubric.score >= threshold;
        let confidence = rubric.score.min(cap);
        let reasoning = if rubric.factors.is_empty() {
            format!("{}: no favourable setup in current conditions", kind.label())
        } else {
            rubric.factors.join(". ")
        };

        TradingStrategy {
            kind,
            recommended,
            confidence,
            reasoning,
            holding_period: kind.holding_period().to_string(),
            risk_level: kind.risk_level(),
            capital_allocation: kind.capital_allocation().to_string(),
            entry_conditions,
            exit_conditions,
        }
    }
}

impl Default for StrategySelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_core::{
        BollingerBands, CandlePattern, CandleType, Macd, SupportResistance, SyntheticOhlc, Trend,
    };

    fn bundle() -> IndicatorBundle {
        IndicatorBundle {
            ohlc: SyntheticOhlc {
                open: 19730.0,
                high: 19920.0,
                low: 19700.0,
                close: 19850.0,
            },
            rsi: 55.0,
            sma20: 19800.0,
            sma50: 19750.0,
            ema20: 19840.0,
            bollinger: BollingerBands {
                upper: 20196.0,
                lower: 19404.0,
                position: 56.0,
            },
            macd: Macd {
                line: 0.5,
                signal: 0.4,
                histogram: 0.1,
            },
            volume: 1_500_000,
            volume_ratio: 1.25,
            atr: 1.1,
            volatility: 12.0,
            levels: SupportResistance {
                support_1: 19700.0,
                support_2: 19590.0,
                resistance_1: 19920.0,
                resistance_2: 20030.0,
            },
        }
    }

    fn conditions(trend: Trend, strength: f64, momentum: f64) -> MarketConditions {
        MarketConditions {
            trend,
            strength,
            momentum,
            candle_pattern: CandlePattern {
                kind: CandleType::Bullish,
                body_size: 0.6,
                upper_wick: 0.2,
                lower_wick: 0.1,
            },
        }
    }

    fn find(strategies: &[TradingStrategy], kind: StrategyKind) -> &TradingStrategy {
        strategies.iter().find(|s| s.kind == kind).unwrap()
    }

    #[test]
    fn scalping_is_zero_when_session_not_open() {
        let selector = StrategySelector::new();
        let mut ind = bundle();
        ind.volatility = 30.0;
        ind.volume_ratio = 1.6;
        ind.rsi = 75.0;
        let cond = conditions(Trend::Bullish, 70.0, 75.0);

        let strategies = selector.select(&ind, &cond, SessionState::Closed, false);
        let scalping = find(&strategies, StrategyKind::Scalping);
        assert_eq!(scalping.confidence, 0.0);
        assert!(!scalping.recommended);

        // Same inputs with an open session cross the threshold.
        let strategies = selector.select(&ind, &cond, SessionState::Open, false);
        let scalping = find(&strategies, StrategyKind::Scalping);
        assert_eq!(scalping.confidence, 70.0); // 25 + 20 + 15 + 10
        assert!(scalping.recommended);
    }

    #[test]
    fn intraday_rubric_adds_up() {
        let selector = StrategySelector::new();
        let ind = bundle(); // volatility 12, ratio 1.25, rsi 55
        let cond = conditions(Trend::Bullish, 65.0, 60.0);
        let strategies = selector.select(&ind, &cond, SessionState::Open, false);
        let intraday = find(&strategies, StrategyKind::Intraday);
        // 20 trend + 15 volatility + 15 volume + 15 strength + 10 rsi + 10 open.
        assert_eq!(intraday.confidence, 85.0);
        assert!(intraday.recommended);
    }

    #[test]
    fn intraday_confidence_caps_at_90() {
        // The full rubric sums to 85, which is under the 90 cap; force the cap
        // path through the scalping ceiling instead: max scalping is 70.
        // So verify caps structurally: no strategy may exceed its ceiling.
        let selector = StrategySelector::new();
        let mut ind = bundle();
        ind.volatility = 22.0;
        ind.volume_ratio = 1.6;
        ind.rsi = 72.0;
        ind.bollinger.position = 80.0;
        let cond = conditions(Trend::StrongBullish, 80.0, 75.0);
        let strategies = selector.select(&ind, &cond, SessionState::Open, true);
        for s in &strategies {
            let cap = match s.kind {
                StrategyKind::Scalping => 95.0,
                StrategyKind::Intraday => 90.0,
                StrategyKind::Btst => 85.0,
                StrategyKind::Positional => 88.0,
            };
            assert!(s.confidence <= cap, "{:?} above cap", s.kind);
        }
    }

    #[test]
    fn btst_needs_the_closing_window_for_its_core_factor() {
        let selector = StrategySelector::new();
        let mut ind = bundle();
        ind.bollinger.position = 65.0;
        ind.volume_ratio = 1.2;
        let cond = conditions(Trend::Bullish, 70.0, 65.0);

        let with_window = selector.select(&ind, &cond, SessionState::Open, true);
        let without = selector.select(&ind, &cond, SessionState::Open, false);
        let a = find(&with_window, StrategyKind::Btst).confidence;
        let b = find(&without, StrategyKind::Btst).confidence;
        assert_eq!(a - b, 25.0);
        // 25 + 15 + 20 + 10 + 10 = 80 with the window.
        assert_eq!(a, 80.0);
        assert!(find(&with_window, StrategyKind::Btst).recommended);
    }

    #[test]
    fn positional_favours_strong_trends() {
        let selector = StrategySelector::new();
        let ind = bundle(); // sma20 > sma50, rsi 55
        let cond = conditions(Trend::StrongBullish, 75.0, 70.0);
        let strategies = selector.select(&ind, &cond, SessionState::Open, false);
        let positional = find(&strategies, StrategyKind::Positional);
        // 30 + 20 + 15 + 15 + 10 = 90 -> capped at 88.
        assert_eq!(positional.confidence, 88.0);
        assert!(positional.recommended);
    }

    #[test]
    fn ranking_is_descending_and_deterministic() {
        let selector = StrategySelector::new();
        let ind = bundle();
        let cond = conditions(Trend::Bullish, 65.0, 60.0);

        let a = selector.select(&ind, &cond, SessionState::Open, false);
        let b = selector.select(&ind, &cond, SessionState::Open, false);
        let order_a: Vec<_> = a.iter().map(|s| s.kind).collect();
        let order_b: Vec<_> = b.iter().map(|s| s.kind).collect();
        assert_eq!(order_a, order_b);
        for pair in a.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    #[test]
    fn ties_keep_input_order() {
        let selector = StrategySelector::new();
        let mut ind = bundle();
        // Engineer BTST == Positional == 15 while scalping scores 0.
        ind.rsi = 50.0;
        ind.volume_ratio = 1.0;
        ind.volatility = 5.0;
        ind.bollinger.position = 70.0;
        ind.macd = Macd {
            line: 0.2,
            signal: 0.4,
            histogram: -0.2,
        };
        ind.sma20 = 19800.0;
        ind.sma50 = 19800.0;
        let cond = conditions(Trend::Sideways, 50.0, 50.0);

        let strategies = selector.select(&ind, &cond, SessionState::Open, false);
        let btst = find(&strategies, StrategyKind::Btst);
        let positional = find(&strategies, StrategyKind::Positional);
        assert_eq!(btst.confidence, 15.0);
        assert_eq!(positional.confidence, 15.0);

        let btst_pos = strategies.iter().position(|s| s.kind == StrategyKind::Btst);
        let positional_pos = strategies
            .iter()
            .position(|s| s.kind == StrategyKind::Positional);
        assert!(btst_pos < positional_pos, "stable sort must keep BTST first");
    }

    #[test]
    fn unfavourable_setup_reports_no_factors() {
        let selector = StrategySelector::new();
        let mut ind = bundle();
        ind.volatility = 5.0;
        ind.volume_ratio = 0.5;
        ind.rsi = 50.0;
        let cond = conditions(Trend::Sideways, 40.0, 50.0);
        let strategies = selector.select(&ind, &cond, SessionState::Weekend, false);
        let scalping = find(&strategies, StrategyKind::Scalping);
        assert!(scalping.reasoning.contains("no favourable setup"));
    }
}
