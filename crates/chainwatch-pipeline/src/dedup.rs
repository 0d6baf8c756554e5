//! Bounded memory of recently seen `(transactionHash, logIndex)` pairs.

use std::collections::{HashSet, VecDeque};

use alloy_primitives::B256;
use chainwatch_rpc::RawLog;

type Key = (B256, u64);

/// Remembers the last `capacity` log identities; the oldest are forgotten
/// first. Logs without a transaction hash are never considered duplicates.
#[derive(Debug)]
pub struct RecentLogs {
    capacity: usize,
    order: VecDeque<Key>,
    seen: HashSet<Key>,
}

impl RecentLogs {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::with_capacity(capacity.max(1)),
            seen: HashSet::with_capacity(capacity.max(1)),
        }
    }

    /// Record `log`; `false` if it was already seen.
    pub fn insert(&mut self, log: &RawLog) -> bool {
        let Some(tx) = log.transaction_hash else {
            return true;
        };
        let key = (tx, log.log_index().unwrap_or(0));
        if !self.seen.insert(key) {
            return false;
        }
        self.order.push_back(key);
        if self.order.len() > self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.seen.remove(&old);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
