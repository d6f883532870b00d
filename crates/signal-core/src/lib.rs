mod error;
mod noise;
mod sentiment;
mod session;
mod traits;
mod types;

pub use error::SignalError;
pub use noise::Noise;
pub use sentiment::{flash_message, rule_based_sentiment};
pub use session::{next_expiry_thursday, SessionClock};
pub use traits::{Broadcaster, ChainSource, Notifier, QuoteSource, SentimentSource};
pub use types::*;
