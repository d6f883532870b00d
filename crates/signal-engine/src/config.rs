use std::env;
use std::str::FromStr;

/// Engine tunables, loaded from the environment with production defaults.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Seconds between ticks while the session is open.
    pub open_interval_secs: u64,
    /// Seconds between ticks outside trading hours.
    pub closed_interval_secs: u64,
    /// Win-probability floor for emitting a signal at all.
    pub min_probability: f64,
    /// Jittered indicator variants scored per tick.
    pub candidates_per_tick: usize,
    /// Signals kept per tick after filtering and ranking.
    pub max_signals: usize,
    /// Only signals at or above this probability are pushed to subscribers.
    pub notify_min_probability: f64,
    /// Remote sentiment classifier; absent means rule-based only.
    pub sentiment_endpoint: Option<String>,
    pub sentiment_api_key: Option<String>,
    /// Fixed noise seed for reproducible runs; absent means entropy.
    pub noise_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            open_interval_secs: 5,
            closed_interval_secs: 30,
            min_probability: 75.0,
            candidates_per_tick: 4,
            max_signals: 3,
            notify_min_probability: 85.0,
            sentiment_endpoint: None,
            sentiment_api_key: None,
            noise_seed: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            open_interval_secs: env_parse("OPEN_SCAN_INTERVAL_SECS", defaults.open_interval_secs),
            closed_interval_secs: env_parse(
                "CLOSED_SCAN_INTERVAL_SECS",
                defaults.closed_interval_secs,
            ),
            min_probability: env_parse("MIN_WIN_PROBABILITY", defaults.min_probability),
            candidates_per_tick: env_parse("CANDIDATES_PER_TICK", defaults.candidates_per_tick),
            max_signals: env_parse("MAX_SIGNALS_PER_TICK", defaults.max_signals),
            notify_min_probability: env_parse(
                "NOTIFY_MIN_PROBABILITY",
                defaults.notify_min_probability,
            ),
            sentiment_endpoint: env::var("SENTIMENT_ENDPOINT").ok(),
            sentiment_api_key: env::var("SENTIMENT_API_KEY").ok(),
            noise_seed: env::var("NOISE_SEED").ok().and_then(|v| v.parse().ok()),
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
