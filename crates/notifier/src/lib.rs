mod registry;
mod templates;
mod whatsapp;

pub use registry::{Subscriber, SubscriberRegistry};
pub use templates::{market_update_message, news_message, signal_message};
pub use whatsapp::{WhatsAppConfig, WhatsAppNotifier};
