//! Per-event-type handler trait.

use async_trait::async_trait;
use chainwatch_rpc::{LogSubscription, RawLog, RpcCaller};

use crate::error::PipelineError;
use crate::market::MarketData;
use crate::notification::FilterDecision;

/// Collaborators available while one event is evaluated.
pub struct EventContext<'a> {
    /// The connection the event arrived on.
    pub rpc: &'a mut dyn RpcCaller,
    pub market: &'a dyn MarketData,
}

/// Decode, enrich and filter one kind of event.
///
/// A handler is immutable after construction; all per-event state lives in
/// the `evaluate` call.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Short name used in logs and metrics.
    fn name(&self) -> &str;

    /// The `logs` filter this handler needs.
    fn subscription(&self) -> &LogSubscription;

    /// Whether this handler is responsible for `log`: same emitting contract
    /// and a `topics[0]` it subscribed to.
    fn matches(&self, log: &RawLog) -> bool {
        let sub = self.subscription();
        log.address == sub.address
            && log
                .topic0()
                .is_some_and(|topic| sub.topics.contains(topic))
    }

    async fn evaluate(
        &self,
        log: &RawLog,
        ctx: &mut EventContext<'_>,
    ) -> Result<FilterDecision, PipelineError>;
}
