use signal_core::{Direction, MarketSnapshot, NewsFlash, TradingSignal};

/// WhatsApp body for a freshly generated signal.
pub fn signal_message(signal: &TradingSignal) -> String {
    let side = match signal.direction {
        Direction::Call => "CE",
        Direction::Put => "PE",
    };
    let mut lines = vec![
        "🚨 NIFTY TRADING SIGNAL".to_string(),
        String::new(),
        format!("📊 {} {:.0} {}", signal.direction.label(), signal.strike_price, side),
        format!("🎯 Target: ₹{:.2}", signal.target_price),
        format!("🛑 Stop Loss: ₹{:.2}", signal.stop_loss),
        format!("📈 Win Probability: {:.0}%", signal.win_probability),
        format!("⚡ Strategy: {} ({})", signal.strategy.label(), signal.holding_period),
        format!("📅 Expiry: {}", signal.expiry_date.format("%d-%b-%Y")),
    ];
    if !signal.probability_factors.is_empty() {
        lines.push(String::new());
        lines.push("Key factors:".to_string());
        for factor in &signal.probability_factors {
            lines.push(format!("• {factor}"));
        }
    }
    lines.push(String::new());
    lines.push(signal.reasoning.clone());
    lines.join("\n")
}

/// Periodic market pulse for subscribers.
pub fn market_update_message(snapshot: &MarketSnapshot) -> String {
    let arrow = if snapshot.change >= 0.0 { "🟢" } else { "🔴" };
    format!(
        "{arrow} NIFTY {:.2} ({:+.2}, {:+.2}%)",
        snapshot.price, snapshot.change, snapshot.change_percent
    )
}

/// One-line rendering of a news flash.
pub fn news_message(flash: &NewsFlash) -> String {
    format!(
        "📰 {} [{}] - {}",
        flash.headline, flash.category, flash.market_reaction
    )
}
