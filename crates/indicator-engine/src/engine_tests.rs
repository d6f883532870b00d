#[cfg(test)]
mod tests {
    use crate::conditions::ConditionAnalyzer;
    use crate::engine::{IndicatorEngine, QuoteContext};
    use signal_core::{
        BollingerBands, CandleType, IndicatorBundle, Macd, MarketSnapshot, Noise, SessionState,
        SupportResistance, SyntheticOhlc, Trend,
    };

    fn snapshot(price: f64, change: f64, change_percent: f64, volume: i64) -> MarketSnapshot {
        MarketSnapshot {
            price,
            change,
            change_percent,
            volume,
            session: SessionState::Open,
        }
    }

    #[test]
    fn ohlc_invariant_holds_across_seeds() {
        let engine = IndicatorEngine::new();
        for seed in 0..300 {
            let mut noise = Noise::seeded(seed);
            let change = if seed % 2 == 0 { 150.0 } else { -220.0 };
            let pct = change / 19850.0 * 100.0;
            let ind = engine.compute(&snapshot(19850.0, change, pct, 1_400_000), &mut noise);

            let min_oc = ind.ohlc.open.min(ind.ohlc.close);
            let max_oc = ind.ohlc.open.max(ind.ohlc.close);
            assert!(
                ind.ohlc.low <= min_oc,
                "seed {seed}: low {} above open/close {}",
                ind.ohlc.low,
                min_oc
            );
            assert!(
                ind.ohlc.high >= max_oc,
                "seed {seed}: high {} below open/close {}",
                ind.ohlc.high,
                max_oc
            );
        }
    }

    #[test]
    fn rsi_clamps_at_both_extremes() {
        let engine = IndicatorEngine::new();
        for seed in 0..50 {
            let mut noise = Noise::seeded(seed);
            // Massive up move: base RSI far above 90 before noise.
            let ind = engine.compute(&snapshot(20000.0, 5000.0, 33.0, 1_400_000), &mut noise);
            assert_eq!(ind.rsi, 90.0);

            let mut noise = Noise::seeded(seed);
            let ind = engine.compute(&snapshot(15000.0, -5000.0, -25.0, 1_400_000), &mut noise);
            assert_eq!(ind.rsi, 10.0);
        }
        // And the general bound for ordinary moves.
        for seed in 0..100 {
            let mut noise = Noise::seeded(seed);
            let ind = engine.compute(&snapshot(19850.0, 120.0, 0.61, 1_500_000), &mut noise);
            assert!((10.0..=90.0).contains(&ind.rsi));
        }
    }

    #[test]
    fn volume_ratio_uses_fixed_baseline() {
        let engine = IndicatorEngine::new();
        let mut noise = Noise::seeded(1);
        let ind = engine.compute(&snapshot(19850.0, 120.0, 0.61, 1_500_000), &mut noise);
        assert_eq!(ind.volume_ratio, 1.25);

        let mut noise = Noise::seeded(1);
        let ind = engine.compute(&snapshot(19850.0, 120.0, 0.61, 0), &mut noise);
        assert_eq!(ind.volume_ratio, 0.5);
    }

    #[test]
    fn synthetic_open_comes_from_change() {
        let engine = IndicatorEngine::new();
        let mut noise = Noise::seeded(9);
        let ind = engine.compute(&snapshot(19850.0, 120.0, 0.61, 1_500_000), &mut noise);
        assert_eq!(ind.ohlc.open, 19730.0);
        assert_eq!(ind.ohlc.close, 19850.0);
    }

    #[test]
    fn open_falls_back_to_volatility_factor_without_context() {
        let engine = IndicatorEngine::new();
        let mut noise = Noise::seeded(9);
        let ind = engine.compute_raw(20000.0, 1_200_000, None, &mut noise);
        // change_percent 0 -> vol factor 0.005 -> open = price * 0.995.
        assert_eq!(ind.ohlc.open, 19900.0);
    }

    #[test]
    fn bollinger_bands_are_two_percent_around_sma20() {
        let engine = IndicatorEngine::new();
        let mut noise = Noise::seeded(3);
        let ind = engine.compute(&snapshot(19850.0, 120.0, 0.61, 1_500_000), &mut noise);
        assert!((ind.bollinger.upper - ind.sma20 * 1.02).abs() < 0.5);
        assert!((ind.bollinger.lower - ind.sma20 * 0.98).abs() < 0.5);
        assert!(ind.bollinger.upper > ind.bollinger.lower);
    }

    #[test]
    fn macd_signal_and_histogram_are_algebraic() {
        let engine = IndicatorEngine::new();
        for seed in 0..30 {
            let mut noise = Noise::seeded(seed);
            let ind = engine.compute(&snapshot(19850.0, 120.0, 0.61, 1_500_000), &mut noise);
            assert!((ind.macd.signal - ind.macd.line * 0.8).abs() < 0.005);
            assert!((ind.macd.histogram - (ind.macd.line - ind.macd.signal)).abs() < 0.005);
        }
    }

    #[test]
    fn support_resistance_brackets_the_range() {
        let engine = IndicatorEngine::new();
        let mut noise = Noise::seeded(11);
        let ind = engine.compute(&snapshot(19850.0, 120.0, 0.61, 1_500_000), &mut noise);
        let range = ind.ohlc.high - ind.ohlc.low;
        assert_eq!(ind.levels.support_1, ind.ohlc.low);
        assert_eq!(ind.levels.resistance_1, ind.ohlc.high);
        assert!((ind.levels.support_2 - (ind.ohlc.low - range * 0.5)).abs() < 0.02);
        assert!((ind.levels.resistance_2 - (ind.ohlc.high + range * 0.5)).abs() < 0.02);
        assert!(ind.levels.support_2 < ind.levels.support_1);
        assert!(ind.levels.resistance_2 > ind.levels.resistance_1);
    }

    #[test]
    fn seeded_compute_is_reproducible() {
        let engine = IndicatorEngine::new();
        let a = engine.compute(&snapshot(19850.0, 120.0, 0.61, 1_500_000), &mut Noise::seeded(77));
        let b = engine.compute(&snapshot(19850.0, 120.0, 0.61, 1_500_000), &mut Noise::seeded(77));
        assert_eq!(a.rsi, b.rsi);
        assert_eq!(a.ohlc.high, b.ohlc.high);
        assert_eq!(a.sma50, b.sma50);
        assert_eq!(a.macd.line, b.macd.line);
    }

    #[test]
    fn jitter_keeps_bounds() {
        let engine = IndicatorEngine::new();
        let mut noise = Noise::seeded(5);
        let base = engine.compute(&snapshot(19850.0, 120.0, 0.61, 1_500_000), &mut noise);
        for _ in 0..200 {
            let j = engine.jitter(&base, &mut noise);
            assert!((10.0..=90.0).contains(&j.rsi));
            assert!(j.volume_ratio >= 0.0);
            assert!(j.volatility >= 0.0);
        }
    }

    // --- ConditionAnalyzer -------------------------------------------------

    fn base_bundle() -> IndicatorBundle {
        IndicatorBundle {
            ohlc: SyntheticOhlc {
                open: 19700.0,
                high: 19900.0,
                low: 19650.0,
                close: 19850.0,
            },
            rsi: 55.0,
            sma20: 19800.0,
            sma50: 19700.0,
            ema20: 19840.0,
            bollinger: BollingerBands {
                upper: 20196.0,
                lower: 19404.0,
                position: 56.3,
            },
            macd: Macd {
                line: 0.5,
                signal: 0.4,
                histogram: 0.1,
            },
            volume: 1_500_000,
            volume_ratio: 1.25,
            atr: 1.26,
            volatility: 2.5,
            levels: SupportResistance {
                support_1: 19650.0,
                support_2: 19525.0,
                resistance_1: 19900.0,
                resistance_2: 20025.0,
            },
        }
    }

    #[test]
    fn ma_alignment_with_high_rsi_is_strong_bullish() {
        let conditions = ConditionAnalyzer::new().analyze(&base_bundle());
        assert_eq!(conditions.trend, Trend::StrongBullish);
    }

    #[test]
    fn ma_alignment_with_low_rsi_is_plain_bullish() {
        let mut ind = base_bundle();
        ind.rsi = 45.0;
        let conditions = ConditionAnalyzer::new().analyze(&ind);
        assert_eq!(conditions.trend, Trend::Bullish);
    }

    #[test]
    fn bearish_ma_alignment_mirrors() {
        let mut ind = base_bundle();
        ind.sma20 = 19900.0;
        ind.sma50 = 19950.0;
        ind.ohlc.close = 19850.0;
        ind.rsi = 42.0;
        let conditions = ConditionAnalyzer::new().analyze(&ind);
        assert_eq!(conditions.trend, Trend::StrongBearish);

        ind.rsi = 58.0;
        let conditions = ConditionAnalyzer::new().analyze(&ind);
        assert_eq!(conditions.trend, Trend::Bearish);
    }

    #[test]
    fn candle_body_fallback_when_mas_disagree() {
        let mut ind = base_bundle();
        // No MA alignment either way.
        ind.sma20 = 19800.0;
        ind.sma50 = 19800.0;
        // Body ~0.76% of open, bullish close.
        let conditions = ConditionAnalyzer::new().analyze(&ind);
        assert_eq!(conditions.trend, Trend::Bullish);

        ind.ohlc.open = 19850.0;
        ind.ohlc.close = 19700.0;
        ind.ohlc.low = 19650.0;
        let conditions = ConditionAnalyzer::new().analyze(&ind);
        assert_eq!(conditions.trend, Trend::Bearish);
    }

    #[test]
    fn small_body_is_sideways() {
        let mut ind = base_bundle();
        ind.sma20 = 19800.0;
        ind.sma50 = 19800.0;
        ind.ohlc.open = 19840.0;
        ind.ohlc.close = 19850.0; // ~0.05% body
        let conditions = ConditionAnalyzer::new().analyze(&ind);
        assert_eq!(conditions.trend, Trend::Sideways);
    }

    #[test]
    fn strength_clamps_to_95() {
        let mut ind = base_bundle();
        ind.rsi = 75.0;
        ind.volume_ratio = 1.6;
        ind.macd.histogram = 0.4;
        ind.bollinger.position = 85.0;
        ind.volatility = 30.0;
        // 50 + 20 + 15 + 10 + 5 + 5 = 105 -> clamp.
        let conditions = ConditionAnalyzer::new().analyze(&ind);
        assert_eq!(conditions.strength, 95.0);
    }

    #[test]
    fn strength_and_momentum_stay_in_bounds() {
        let analyzer = ConditionAnalyzer::new();
        for rsi in [10.0, 35.0, 50.0, 65.0, 90.0] {
            for ratio in [0.3, 1.0, 1.3, 1.8] {
                let mut ind = base_bundle();
                ind.rsi = rsi;
                ind.volume_ratio = ratio;
                let conditions = analyzer.analyze(&ind);
                assert!((30.0..=95.0).contains(&conditions.strength));
                assert!((20.0..=90.0).contains(&conditions.momentum));
            }
        }
    }

    #[test]
    fn momentum_clamps_on_outsized_moves() {
        let mut ind = base_bundle();
        ind.ohlc.open = 19000.0;
        ind.ohlc.close = 19850.0;
        ind.ohlc.low = 18950.0;
        let conditions = ConditionAnalyzer::new().analyze(&ind);
        assert_eq!(conditions.momentum, 90.0);

        let mut ind = base_bundle();
        ind.ohlc.open = 19850.0;
        ind.ohlc.close = 19000.0;
        ind.ohlc.low = 18950.0;
        ind.macd.line = 0.2;
        ind.macd.signal = 0.4;
        ind.volume_ratio = 0.8;
        let conditions = ConditionAnalyzer::new().analyze(&ind);
        assert_eq!(conditions.momentum, 20.0);
    }

    #[test]
    fn candle_classification_from_close_vs_open() {
        let analyzer = ConditionAnalyzer::new();

        let ind = base_bundle();
        assert_eq!(analyzer.analyze(&ind).candle_pattern.kind, CandleType::Bullish);

        let mut ind = base_bundle();
        ind.ohlc.open = 19900.0;
        ind.ohlc.close = 19850.0;
        assert_eq!(analyzer.analyze(&ind).candle_pattern.kind, CandleType::Bearish);

        let mut ind = base_bundle();
        ind.ohlc.open = 19850.0;
        ind.ohlc.close = 19850.0;
        assert_eq!(analyzer.analyze(&ind).candle_pattern.kind, CandleType::Doji);
    }

    #[test]
    fn wick_sizes_are_percent_of_body_edges() {
        let mut ind = base_bundle();
        ind.ohlc = SyntheticOhlc {
            open: 100.0,
            high: 106.0,
            low: 98.0,
            close: 104.0,
        };
        let candle = ConditionAnalyzer::new().analyze(&ind).candle_pattern;
        assert_eq!(candle.body_size, 4.0);
        // (106 - 104) / 104 and (100 - 98) / 100.
        assert!((candle.upper_wick - 1.92).abs() < 0.01);
        assert!((candle.lower_wick - 2.0).abs() < 0.01);
    }
}
