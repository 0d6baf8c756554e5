//! The deployed watchers and the wiring that turns a [`WatchConfig`] into a
//! ready [`Pipeline`].

pub mod flap;
pub mod four;
pub mod pancake;

use std::sync::Arc;
use std::time::Duration;

pub use flap::FlapWatcher;
pub use four::FourWatcher;
pub use pancake::PancakeWatcher;

use crate::config::WatchConfig;
use crate::error::ConfigError;
use crate::handler::EventHandler;
use crate::market::BinanceMarketData;
use crate::notifier::{LogNotifier, Notifier, TelegramNotifier};
use crate::pipeline::Pipeline;

/// Handlers for every enabled watcher, in a fixed order.
pub fn build_handlers(config: &WatchConfig) -> Vec<Arc<dyn EventHandler>> {
    let w = &config.watchers;
    let mut handlers: Vec<Arc<dyn EventHandler>> = Vec::new();
    if w.flap.enabled {
        handlers.push(Arc::new(FlapWatcher::new(&w.flap)));
    }
    if w.four.enabled {
        handlers.push(Arc::new(FourWatcher::new(&w.four)));
    }
    if w.pancake.enabled {
        handlers.push(Arc::new(PancakeWatcher::new(&w.pancake)));
    }
    handlers
}

/// Telegram when a bot token is configured, otherwise log-only.
pub fn build_notifier(config: &WatchConfig) -> Result<Arc<dyn Notifier>, ConfigError> {
    let tg = &config.telegram;
    match tg.bot_token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => {
            let notifier = TelegramNotifier::new(
                &tg.api_base,
                token,
                tg.chat_id.clone(),
                Duration::from_millis(tg.timeout_ms),
            )
            .map_err(|e| ConfigError::Invalid(format!("telegram client: {e}")))?;
            Ok(Arc::new(notifier))
        }
        None => {
            tracing::warn!("no telegram bot token configured, notifications will only be logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}

pub fn build_pipeline(config: &WatchConfig) -> Result<Pipeline, ConfigError> {
    let market = BinanceMarketData::new(config.market_config())
        .map_err(|e| ConfigError::Invalid(format!("market data client: {e}")))?;
    let notifier = build_notifier(config)?;
    let pipeline = build_handlers(config).into_iter().fold(
        Pipeline::new(Arc::new(market), notifier),
        Pipeline::with_handler,
    );
    Ok(pipeline.with_dedup(config.pipeline.dedup_capacity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handlers_follow_enabled_flags() {
        let mut config = WatchConfig::default();
        assert_eq!(build_handlers(&config).len(), 3);

        config.watchers.only(&["pancake", "flap"]);
        let names: Vec<String> = build_handlers(&config)
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        assert_eq!(names, ["flap", "pancake"]);
    }

    #[test]
    fn pipeline_subscribes_per_watcher() {
        let mut config = WatchConfig::default();
        config.watchers.only(&["four", "pancake"]);
        let pipeline = build_pipeline(&config).unwrap();
        let subs = pipeline.subscriptions();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].label, "four");
        assert_eq!(subs[0].topics.len(), 2);
        assert_eq!(subs[1].address, config.watchers.pancake.factory);
    }
}
