//! Routes each live log to its handler and dispatches the outcome.
//!
//! Nothing that goes wrong for one event (decode, enrichment, dispatch)
//! escapes [`Pipeline::process`]; only the transport can end a session.

use std::sync::Arc;

use async_trait::async_trait;
use chainwatch_rpc::{Connection, LogSink, LogSubscription, RawLog, RpcCaller};

use crate::dedup::RecentLogs;
use crate::handler::{EventContext, EventHandler};
use crate::market::MarketData;
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::notification::FilterDecision;
use crate::notifier::Notifier;

pub struct Pipeline {
    handlers: Vec<Arc<dyn EventHandler>>,
    market: Arc<dyn MarketData>,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<PipelineMetrics>,
    recent: Option<RecentLogs>,
}

impl Pipeline {
    pub fn new(market: Arc<dyn MarketData>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            handlers: Vec::new(),
            market,
            notifier,
            metrics: Arc::new(PipelineMetrics::default()),
            recent: None,
        }
    }

    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Drop repeated `(transactionHash, logIndex)` pairs among the last
    /// `capacity` logs. `0` leaves duplicate suppression off.
    pub fn with_dedup(mut self, capacity: usize) -> Self {
        self.recent = (capacity > 0).then(|| RecentLogs::new(capacity));
        self
    }

    /// Subscriptions for every registered handler, in registration order.
    pub fn subscriptions(&self) -> Vec<LogSubscription> {
        self.handlers.iter().map(|h| h.subscription().clone()).collect()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn metrics_handle(&self) -> Arc<PipelineMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run one log through route → decode/enrich/filter → dispatch.
    pub async fn process(&mut self, log: &RawLog, rpc: &mut dyn RpcCaller) {
        PipelineMetrics::incr(&self.metrics.received);

        let Some(handler) = self.handlers.iter().find(|h| h.matches(log)).cloned() else {
            PipelineMetrics::incr(&self.metrics.unmatched);
            tracing::debug!(
                address = %log.address,
                topic0 = ?log.topic0(),
                "no handler for log"
            );
            return;
        };

        if let Some(recent) = self.recent.as_mut() {
            if !recent.insert(log) {
                PipelineMetrics::incr(&self.metrics.duplicates);
                tracing::info!(handler = handler.name(), tx_hash = ?log.transaction_hash, "duplicate log dropped");
                return;
            }
        }

        let mut ctx = EventContext {
            rpc,
            market: self.market.as_ref(),
        };
        let decision = match handler.evaluate(log, &mut ctx).await {
            Ok(decision) => decision,
            Err(e) if e.is_decode() => {
                PipelineMetrics::incr(&self.metrics.decode_errors);
                tracing::error!(handler = handler.name(), tx_hash = ?log.transaction_hash, error = %e, "dropping undecodable event");
                return;
            }
            Err(e) => {
                PipelineMetrics::incr(&self.metrics.enrichment_errors);
                tracing::warn!(handler = handler.name(), tx_hash = ?log.transaction_hash, error = %e, "dropping event");
                return;
            }
        };

        match decision {
            FilterDecision::Suppressed(reason) => {
                PipelineMetrics::incr(&self.metrics.suppressed);
                tracing::info!(handler = handler.name(), tx_hash = ?log.transaction_hash, reason = %reason, "suppressed");
            }
            FilterDecision::Notify(notification) => match self.notifier.send(&notification).await {
                Ok(()) => {
                    PipelineMetrics::incr(&self.metrics.notified);
                    tracing::info!(handler = handler.name(), tx_hash = ?log.transaction_hash, "notified");
                }
                Err(e) => {
                    PipelineMetrics::incr(&self.metrics.dispatch_failures);
                    tracing::warn!(handler = handler.name(), error = %e, "notification not delivered");
                }
            },
        }
    }
}

#[async_trait]
impl LogSink for Pipeline {
    async fn on_log(&mut self, log: RawLog, conn: &mut Connection) {
        self.process(&log, conn).await;
    }
}
