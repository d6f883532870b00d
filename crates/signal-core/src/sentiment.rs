use crate::{MarketSentiment, MarketSnapshot, Sentiment, SessionState, TradeRecommendation};

/// Rule-based sentiment fallback over the percent change. Always available;
/// used whenever the remote classifier is absent or fails.
pub fn rule_based_sentiment(snapshot: &MarketSnapshot) -> MarketSentiment {
    let change = snapshot.change;
    let change_percent = snapshot.change_percent;

    if snapshot.session != SessionState::Open {
        // Closed market: classify the last known move, recommend monitoring.
        return if change_percent.abs() > 0.5 {
            MarketSentiment {
                sentiment: if change > 0.0 {
                    Sentiment::Bullish
                } else {
                    Sentiment::Bearish
                },
                recommendation: TradeRecommendation::Monitor,
                reasoning: format!(
                    "Market closed with {:.1}% {} - monitor for next session",
                    change_percent.abs(),
                    if change > 0.0 { "gain" } else { "loss" }
                ),
            }
        } else {
            MarketSentiment {
                sentiment: Sentiment::Neutral,
                recommendation: TradeRecommendation::Monitor,
                reasoning: "Market closed with minimal movement - wait for next session".to_string(),
            }
        };
    }

    if change_percent > 1.0 {
        MarketSentiment {
            sentiment: Sentiment::Bullish,
            recommendation: TradeRecommendation::BuyCall,
            reasoning: "Strong positive momentum with over 1% gain".to_string(),
        }
    } else if change_percent < -1.0 {
        MarketSentiment {
            sentiment: Sentiment::Bearish,
            recommendation: TradeRecommendation::BuyPut,
            reasoning: "Significant decline with over 1% loss".to_string(),
        }
    } else if change_percent.abs() > 0.5 {
        let bullish = change > 0.0;
        MarketSentiment {
            sentiment: if bullish {
                Sentiment::Bullish
            } else {
                Sentiment::Bearish
            },
            recommendation: if bullish {
                TradeRecommendation::BuyCall
            } else {
                TradeRecommendation::BuyPut
            },
            reasoning: format!(
                "Moderate {} movement",
                if bullish { "upward" } else { "downward" }
            ),
        }
    } else {
        MarketSentiment {
            sentiment: Sentiment::Neutral,
            recommendation: TradeRecommendation::DontTrade,
            reasoning: "Low volatility, range-bound movement".to_string(),
        }
    }
}

/// Dashboard banner for the current sentiment and session.
pub fn flash_message(sentiment: &MarketSentiment, session: SessionState) -> String {
    match session {
        SessionState::Weekend => {
            "Market closed for the weekend. Signals resume Monday 09:15 IST.".to_string()
        }
        SessionState::PreMarket => "Pre-market: watching for the opening range.".to_string(),
        SessionState::Closed => "Market closed. Next session opens 09:15 IST.".to_string(),
        SessionState::Open => match sentiment.recommendation {
            TradeRecommendation::BuyCall => "Bullish bias: call setups in play.".to_string(),
            TradeRecommendation::BuyPut => "Bearish bias: put setups in play.".to_string(),
            TradeRecommendation::DontTrade => "Choppy tape: best to stay light.".to_string(),
            TradeRecommendation::Monitor => "Monitoring for a tradeable move.".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(change_percent: f64, session: SessionState) -> MarketSnapshot {
        MarketSnapshot {
            price: 19850.0,
            change: change_percent / 100.0 * 19850.0,
            change_percent,
            volume: 1_000_000,
            session,
        }
    }

    #[test]
    fn strong_gain_recommends_call() {
        let s = rule_based_sentiment(&snapshot(1.2, SessionState::Open));
        assert_eq!(s.sentiment, Sentiment::Bullish);
        assert_eq!(s.recommendation, TradeRecommendation::BuyCall);
    }

    #[test]
    fn strong_loss_recommends_put() {
        let s = rule_based_sentiment(&snapshot(-1.4, SessionState::Open));
        assert_eq!(s.sentiment, Sentiment::Bearish);
        assert_eq!(s.recommendation, TradeRecommendation::BuyPut);
    }

    #[test]
    fn moderate_move_follows_direction() {
        let s = rule_based_sentiment(&snapshot(-0.7, SessionState::Open));
        assert_eq!(s.sentiment, Sentiment::Bearish);
        assert_eq!(s.recommendation, TradeRecommendation::BuyPut);
    }

    #[test]
    fn flat_market_says_dont_trade() {
        let s = rule_based_sentiment(&snapshot(0.2, SessionState::Open));
        assert_eq!(s.sentiment, Sentiment::Neutral);
        assert_eq!(s.recommendation, TradeRecommendation::DontTrade);
    }

    #[test]
    fn flash_banner_tracks_session_then_recommendation() {
        let open_bullish = rule_based_sentiment(&snapshot(1.2, SessionState::Open));
        assert_eq!(
            flash_message(&open_bullish, SessionState::Open),
            "Bullish bias: call setups in play."
        );
        // Session state outranks any recommendation.
        assert!(flash_message(&open_bullish, SessionState::Weekend).contains("weekend"));
    }

    #[test]
    fn closed_market_always_monitors() {
        let s = rule_based_sentiment(&snapshot(1.8, SessionState::Closed));
        assert_eq!(s.sentiment, Sentiment::Bullish);
        assert_eq!(s.recommendation, TradeRecommendation::Monitor);

        let s = rule_based_sentiment(&snapshot(0.1, SessionState::Weekend));
        assert_eq!(s.sentiment, Sentiment::Neutral);
        assert_eq!(s.recommendation, TradeRecommendation::Monitor);
    }
}
