use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::info;

use api_server::{router, AppState, EventBus};
use market_data::{MarketDataClient, RemoteSentiment, RuleBasedSentiment};
use notifier::{SubscriberRegistry, WhatsAppConfig, WhatsAppNotifier};
use signal_core::{SentimentSource, SessionClock};
use signal_engine::{EngineConfig, EngineDeps, SignalEngine};
use signal_store::SignalStore;
use strategy_selector::StrategySelector;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    info!("Starting NIFTY signal server");

    let config = EngineConfig::from_env();
    info!(
        open_interval = config.open_interval_secs,
        min_probability = config.min_probability,
        "Configuration loaded"
    );

    let clock = SessionClock::new();
    let store = Arc::new(SignalStore::new());

    let whatsapp = WhatsAppConfig::from_env();
    if !whatsapp.is_configured() {
        info!("WhatsApp credentials absent, notifications run in dry-run mode");
    }
    let registry = Arc::new(SubscriberRegistry::new(whatsapp.seed_subscribers.clone()));
    let notifier = Arc::new(WhatsAppNotifier::new(whatsapp, registry.clone()));

    let market = Arc::new(MarketDataClient::new(clock.clone()));
    let sentiment: Arc<dyn SentimentSource> = match &config.sentiment_endpoint {
        Some(endpoint) => Arc::new(RemoteSentiment::new(
            endpoint.clone(),
            config.sentiment_api_key.clone(),
        )),
        None => Arc::new(RuleBasedSentiment),
    };

    let events = EventBus::new(1024);
    let deps = EngineDeps {
        quotes: market.clone(),
        chain: market,
        sentiment,
        notifier,
        broadcaster: Arc::new(events.clone()),
    };
    let engine = SignalEngine::new(config, deps, store.clone(), clock.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let engine_handle = tokio::spawn(engine.run(shutdown_rx));

    let state = AppState {
        store,
        clock,
        registry,
        events,
        selector: Arc::new(StrategySelector::new()),
    };

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Let the engine finish its in-flight tick before exiting.
    let _ = shutdown_tx.send(true);
    engine_handle.await?;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let mut sigterm =
        tokio::signal::unix::signal(SignalKind::terminate()).expect("install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM");
        }
    }
}
