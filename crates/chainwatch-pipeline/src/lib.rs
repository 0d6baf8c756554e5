//! chainwatch-pipeline: what happens to a log after it arrives.
//!
//! # Overview
//!
//! Each live log is routed to the [`EventHandler`] whose subscription it
//! matches, decoded with a [`chainwatch_abi::Schema`], enriched (RPC calls on
//! the same connection, market data over HTTP), run through an ordered
//! filter chain and finally either suppressed with a reason or handed to a
//! [`Notifier`].
//!
//! - [`Pipeline`]: routing, per-event error isolation, counters
//! - [`watchers`]: the flap, four and pancake deployments
//! - [`WatchConfig`]: YAML + environment configuration
//! - [`MarketData`] / [`Notifier`]: external collaborators behind traits
//!
//! A failure while handling one event never ends the session; only the
//! transport can do that.

pub mod config;
pub mod dedup;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod format;
pub mod handler;
pub mod links;
pub mod market;
pub mod metrics;
pub mod notification;
pub mod notifier;
pub mod pipeline;
pub mod watchers;

pub use config::WatchConfig;
pub use dedup::RecentLogs;
pub use error::{ConfigError, DispatchError, MarketDataError, PipelineError};
pub use filter::{Denylist, Verdict};
pub use handler::{EventContext, EventHandler};
pub use market::{BinanceMarketData, MarketData, MarketDataConfig, MarketInfo, TokenMeta};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use notification::{FilterDecision, LinkButton, Notification};
pub use notifier::{LogNotifier, Notifier, TelegramNotifier};
pub use pipeline::Pipeline;
pub use watchers::{build_pipeline, FlapWatcher, FourWatcher, PancakeWatcher};
