use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::warn;

use signal_core::{AlertKind, Broadcaster, Direction, Noise, Notifier, TradingSignal};
use signal_store::SignalStore;

/// Positions older than this get an advisory exit alert regardless of P&L.
const MAX_HOLD_HOURS: i64 = 2;

/// One alert raised during a monitoring pass, ready for delivery.
#[derive(Debug, Clone)]
pub struct TradeAlert {
    pub trade_id: u64,
    pub signal_id: u64,
    pub user_id: String,
    pub kind: AlertKind,
    pub price: f64,
    pub pnl: f64,
    pub pnl_percent: f64,
    pub raised_at: DateTime<Utc>,
}

impl TradeAlert {
    pub fn message(&self) -> String {
        let position = format!(
            "trade #{} at {:.2} (P&L {:+.2}, {:+.1}%)",
            self.trade_id, self.price, self.pnl, self.pnl_percent
        );
        match self.kind {
            AlertKind::TargetHit => format!("Target hit! Book profits on {position}"),
            AlertKind::StopLossHit => format!("Stop loss hit. Exit {position}"),
            AlertKind::Profit50 => format!("Up 50%+. Consider partial booking on {position}"),
            AlertKind::Profit25 => format!("Up 25%+. Trail your stop on {position}"),
            AlertKind::Loss20 => format!("Down 20%. Review {position}"),
            AlertKind::Loss10 => format!("Down 10%. Watch {position}"),
            AlertKind::TimeExit => format!("Held over {MAX_HOLD_HOURS}h. Time-based exit suggested for {position}"),
        }
    }
}

/// Re-marks every active position against the latest index level and raises
/// each alert kind at most once per trade.
pub struct TradeMonitor;

impl TradeMonitor {
    pub fn new() -> Self {
        Self
    }

    /// Mutation pass: re-price, recompute P&L, collect newly-raised alerts.
    /// Runs synchronously under the store lock; delivery happens after.
    pub fn check_trades(
        &self,
        store: &SignalStore,
        index_price: f64,
        now: DateTime<Utc>,
        noise: &mut Noise,
    ) -> Vec<TradeAlert> {
        let mut alerts = Vec::new();

        store.update_active_trades(|trade, signal| {
            // Without the originating signal there is no strike to mark
            // against; leave the position as-is.
            let Some(signal) = signal else { return };

            let price = mark_price(signal, index_price, noise);
            trade.current_price = price;
            trade.pnl = (price - trade.entry_price) * f64::from(trade.quantity);
            trade.pnl_percent = if trade.entry_price > 0.0 {
                (price - trade.entry_price) / trade.entry_price * 100.0
            } else {
                0.0
            };

            if price >= signal.target_price {
                trade.target_hit = true;
            }
            if price <= signal.stop_loss {
                trade.sl_hit = true;
            }

            // Walk the ladder top-down and raise the first matching tier
            // that has not fired yet. A tier consumed on an earlier pass
            // lets the next matching one through.
            let tiers = [
                (price >= signal.target_price, AlertKind::TargetHit),
                (price <= signal.stop_loss, AlertKind::StopLossHit),
                (trade.pnl_percent >= 50.0, AlertKind::Profit50),
                (trade.pnl_percent >= 25.0, AlertKind::Profit25),
                (trade.pnl_percent <= -20.0, AlertKind::Loss20),
                (trade.pnl_percent <= -10.0, AlertKind::Loss10),
            ];
            let mut raised = Vec::new();
            if let Some((_, kind)) = tiers
                .iter()
                .find(|(hit, kind)| *hit && !trade.alerts_sent.contains(kind))
            {
                trade.alerts_sent.insert(*kind);
                raised.push(*kind);
            }
            // Time-based exit is independent of the P&L ladder.
            if now - trade.entry_time >= Duration::hours(MAX_HOLD_HOURS)
                && trade.alerts_sent.insert(AlertKind::TimeExit)
            {
                raised.push(AlertKind::TimeExit);
            }

            if !raised.is_empty() {
                trade.last_alert_at = Some(now);
            }
            for kind in raised {
                alerts.push(TradeAlert {
                    trade_id: trade.id,
                    signal_id: trade.signal_id,
                    user_id: trade.user_id.clone(),
                    kind,
                    price,
                    pnl: trade.pnl,
                    pnl_percent: trade.pnl_percent,
                    raised_at: now,
                });
            }
        });

        alerts
    }

    /// Best-effort fan-out: every alert goes to the dashboard and to the
    /// position owner. A failed send is logged and never propagated.
    /// Associated rather than a method so callers can move it onto a
    /// background task.
    pub async fn deliver(
        alerts: &[TradeAlert],
        notifier: &dyn Notifier,
        broadcaster: &dyn Broadcaster,
    ) {
        for alert in alerts {
            broadcaster.publish(
                "trade_alert",
                json!({
                    "trade_id": alert.trade_id,
                    "signal_id": alert.signal_id,
                    "alert_type": alert.kind.label(),
                    "current_price": alert.price,
                    "pnl": alert.pnl,
                    "pnl_percent": alert.pnl_percent,
                    "message": alert.message(),
                }),
            );
            if let Err(err) = notifier.send(&alert.user_id, &alert.message()).await {
                warn!(trade_id = alert.trade_id, %err, "trade alert delivery failed");
            }
        }
    }
}

impl Default for TradeMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple premium model for marking open positions: intrinsic value plus a
/// distance-decayed time value, with a small random spread.
fn mark_price(signal: &TradingSignal, index_price: f64, noise: &mut Noise) -> f64 {
    let intrinsic = match signal.direction {
        Direction::Call => (index_price - signal.strike_price).max(0.0),
        Direction::Put => (signal.strike_price - index_price).max(0.0),
    };
    let time_value = 20.0 + 0.1 * (index_price - signal.strike_price).abs();
    let spread = noise.uniform(-2.0, 2.0);
    let price = (intrinsic + time_value + spread).max(0.05);
    (price * 100.0).round() / 100.0
}
