use signal_core::{
    BollingerBands, IndicatorBundle, Macd, MarketSnapshot, Noise, SupportResistance, SyntheticOhlc,
};

/// Fixed average NIFTY volume used as the volume-ratio baseline.
const VOLUME_BASELINE: f64 = 1_200_000.0;

/// Absolute change / percent-change context for the synthetic open.
#[derive(Debug, Clone, Copy)]
pub struct QuoteContext {
    pub change: f64,
    pub change_percent: f64,
}

/// Derives a synthetic OHLC bar and the full indicator bundle from a single
/// quote. The values are a parameterized simulation around the live price,
/// not historical computations; all randomness flows through the injected
/// [`Noise`] source.
pub struct IndicatorEngine;

impl IndicatorEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(&self, snapshot: &MarketSnapshot, noise: &mut Noise) -> IndicatorBundle {
        self.compute_raw(
            snapshot.price,
            snapshot.volume,
            Some(QuoteContext {
                change: snapshot.change,
                change_percent: snapshot.change_percent,
            }),
            noise,
        )
    }

    pub fn compute_raw(
        &self,
        price: f64,
        volume: i64,
        context: Option<QuoteContext>,
        noise: &mut Noise,
    ) -> IndicatorBundle {
        let change_percent = context.map(|c| c.change_percent).unwrap_or(0.0);

        // Percent-change magnitude doubles as the volatility proxy.
        let vol_factor = change_percent.abs() / 100.0 + 0.005;

        let open = match context {
            Some(c) => price - c.change,
            None => price * (1.0 - vol_factor),
        };

        let daily_range = price * vol_factor;
        let mut high = price.max(open) + daily_range * noise.uniform(0.3, 0.7);
        let mut low = price.min(open) - daily_range * noise.uniform(0.3, 0.7);

        // Mandatory clamp: low <= {open, close} <= high must hold regardless
        // of the random draws above.
        high = high.max(price).max(open);
        low = low.min(price).min(open);

        let intraday_momentum = if open > 0.0 {
            (price - open) / open * 100.0
        } else {
            0.0
        };
        let rsi = (50.0 + intraday_momentum * 2.0 + noise.uniform(-10.0, 10.0)).clamp(10.0, 90.0);

        // Jittered stand-ins that stay close to price (SMA20 tightest).
        let sma20 = price * (0.995 + noise.uniform(0.0, 0.01));
        let sma50 = price * (0.99 + noise.uniform(0.0, 0.02));
        let ema20 = price * (0.998 + noise.uniform(0.0, 0.004));

        let bb_upper = sma20 * 1.02;
        let bb_lower = sma20 * 0.98;
        let bb_position = (price - bb_lower) / (bb_upper - bb_lower) * 100.0;

        let macd_line = (ema20 - sma20) / price * 1000.0;
        let macd_signal = macd_line * 0.8;
        let macd_histogram = macd_line - macd_signal;

        let atr = (high - low) / price * 100.0;
        let volatility = change_percent.abs() * 2.0 + atr;

        let volume_ratio = if volume > 0 {
            volume as f64 / VOLUME_BASELINE
        } else {
            0.5
        };

        let range = high - low;

        IndicatorBundle {
            ohlc: SyntheticOhlc {
                open: round2(open),
                high: round2(high),
                low: round2(low),
                close: round2(price),
            },
            rsi: round1(rsi),
            sma20: round2(sma20),
            sma50: round2(sma50),
            ema20: round2(ema20),
            bollinger: BollingerBands {
                upper: round2(bb_upper),
                lower: round2(bb_lower),
                position: round1(bb_position),
            },
            macd: Macd {
                line: round3(macd_line),
                signal: round3(macd_signal),
                histogram: round3(macd_histogram),
            },
            volume,
            volume_ratio: round2(volume_ratio),
            atr: round2(atr),
            volatility: round1(volatility),
            levels: SupportResistance {
                support_1: round2(low),
                support_2: round2(low - range * 0.5),
                resistance_1: round2(high),
                resistance_2: round2(high + range * 0.5),
            },
        }
    }

    /// Produce a perturbed copy of a bundle. The signal generator scores
    /// several jittered variants per tick and keeps only the best.
    pub fn jitter(&self, bundle: &IndicatorBundle, noise: &mut Noise) -> IndicatorBundle {
        let mut out = bundle.clone();
        out.rsi = round1((bundle.rsi + noise.uniform(-6.0, 6.0)).clamp(10.0, 90.0));
        out.volume_ratio = round2((bundle.volume_ratio * noise.uniform(0.92, 1.08)).max(0.0));
        out.volatility = round1((bundle.volatility + noise.uniform(-2.0, 2.0)).max(0.0));
        out.macd.histogram = round3(bundle.macd.histogram * noise.uniform(0.85, 1.15));
        out.bollinger.position = round1(bundle.bollinger.position + noise.uniform(-8.0, 8.0));
        out
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub(crate) fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub(crate) fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
